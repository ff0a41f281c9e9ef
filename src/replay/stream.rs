//! Incremental frame reader
//!
//! Decoded replays are large, so the document is never materialized: the JSON
//! deserializer walks down to `content.frames` and converts each frame as soon
//! as it is parsed. Frames cross to the async side over a bounded channel,
//! which pauses the reader whenever the parser falls behind.

use std::cell::Cell;
use std::fmt;
use std::io::{BufReader, Read};

use futures::Stream;
use serde::de::{DeserializeSeed, Error as _, IgnoredAny, MapAccess, SeqAccess, Visitor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

use super::parser::ParseError;
use super::protocol::FrameWire;
use super::Frame;

pub type FrameResult = Result<Frame, ParseError>;

/// Stream the frames of one decoded replay document.
/// At most `capacity` converted frames are buffered ahead of the consumer.
pub fn read_frames<R>(reader: R, capacity: usize) -> impl Stream<Item = FrameResult>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::task::spawn_blocking(move || read_document(reader, &tx));

    futures::stream::unfold(
        (rx, Some(task)),
        |(mut rx, task): (mpsc::Receiver<FrameResult>, Option<JoinHandle<()>>)| async move {
            if let Some(item) = rx.recv().await {
                return Some((item, (rx, task)));
            }
            // Channel closed: make sure the reader finished rather than died
            match task?.await {
                Ok(()) => None,
                Err(e) => {
                    error!(error = %e, "Frame reader task failed");
                    Some((Err(ParseError::ReaderPanicked), (rx, None)))
                }
            }
        },
    )
}

/// Runs on a blocking thread until the document ends, an error is sent, or
/// the consumer goes away.
fn read_document<R: Read>(reader: R, tx: &mpsc::Sender<FrameResult>) {
    let sender = FrameSender {
        tx,
        next_index: Cell::new(0),
        stopped: Cell::new(false),
    };

    let mut de = serde_json::Deserializer::from_reader(BufReader::new(reader));
    let result = ReplayDocument(&sender)
        .deserialize(&mut de)
        .and_then(|()| de.end());

    if let Err(e) = result {
        if !sender.stopped.get() {
            let _ = tx.blocking_send(Err(ParseError::Json(e)));
        }
    }
}

struct FrameSender<'a> {
    tx: &'a mpsc::Sender<FrameResult>,
    next_index: Cell<usize>,
    /// Set once nothing more may be sent
    stopped: Cell<bool>,
}

impl FrameSender<'_> {
    fn send(&self, wire: FrameWire) -> Result<(), &'static str> {
        let index = self.next_index.get();
        self.next_index.set(index + 1);

        let item = wire.into_frame(index);
        let failed = item.is_err();

        if self.tx.blocking_send(item).is_err() {
            self.stopped.set(true);
            return Err("frame consumer dropped");
        }
        if failed {
            self.stopped.set(true);
            return Err("frame conversion failed");
        }
        Ok(())
    }
}

/// Top level: `{ ..., "content": { ... }, ... }`
struct ReplayDocument<'a>(&'a FrameSender<'a>);

impl<'de> DeserializeSeed<'de> for ReplayDocument<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for ReplayDocument<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decoded replay document")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "content" {
                map.next_value_seed(Content(self.0))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

/// `content`: `{ ..., "frames": [ ... ], ... }`
struct Content<'a>(&'a FrameSender<'a>);

impl<'de> DeserializeSeed<'de> for Content<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for Content<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("replay content")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "frames" {
                map.next_value_seed(Frames(self.0))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

/// `frames`: each element is converted and sent before the next is read
struct Frames<'a>(&'a FrameSender<'a>);

impl<'de> DeserializeSeed<'de> for Frames<'_> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for Frames<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of frames")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(wire) = seq.next_element::<FrameWire>()? {
            self.0.send(wire).map_err(A::Error::custom)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{AttributeUpdate, Replication};
    use futures::StreamExt;
    use std::io::Cursor;

    fn reader(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn reads_frames_and_skips_other_keys() {
        let doc = r#"{
            "header": { "body": { "properties": { "TeamSize": 1 } } },
            "content": {
                "body": { "levels": ["stadium_p"], "keyframes": [] },
                "frames": [
                    { "time": 0.0, "delta": 0.0, "replications": [
                        { "actor_id": { "value": 3 },
                          "value": { "spawned_replication_value": { "object_name": "Archetypes.Ball.Ball_Default" } } }
                    ] },
                    { "time": 0.03, "delta": 0.03, "replications": [
                        { "actor_id": { "value": 8 },
                          "value": { "updated_replication_value": [
                            { "name": "TAGame.GameEvent_TA:ReplicatedGameStateTimeRemaining",
                              "value": { "int_attribute_value": 0 } } ] } }
                    ] }
                ]
            }
        }"#;

        let frames: Vec<_> = read_frames(reader(doc), 1).collect().await;
        assert_eq!(frames.len(), 2);

        let first = frames[0].as_ref().unwrap();
        assert_eq!(
            first.replications,
            vec![Replication::spawned(3, "Archetypes.Ball.Ball_Default")]
        );
        let second = frames[1].as_ref().unwrap();
        assert_eq!(
            second.replications,
            vec![Replication::updated(8, vec![AttributeUpdate::TimeRemaining(0)])]
        );
    }

    #[tokio::test]
    async fn stops_after_first_bad_frame() {
        let doc = r#"{ "content": { "frames": [
            { "delta": 0.1, "replications": [] },
            { "replications": [] },
            { "delta": 0.1, "replications": [] }
        ] } }"#;

        let frames: Vec<_> = read_frames(reader(doc), 4).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(ParseError::MissingDelta { frame: 1 })));
    }

    #[tokio::test]
    async fn truncated_document_is_a_json_error() {
        let doc = r#"{ "content": { "frames": [ { "delta": 0.1, "replications": [] }, { "delta": "#;

        let frames: Vec<_> = read_frames(reader(doc), 4).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(ParseError::Json(_))));
    }

    #[tokio::test]
    async fn document_without_frames_is_empty() {
        let frames: Vec<_> = read_frames(reader(r#"{ "header": {} }"#), 4).collect().await;
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_reader() {
        let mut doc = String::from(r#"{ "content": { "frames": ["#);
        for i in 0..100 {
            if i > 0 {
                doc.push(',');
            }
            doc.push_str(r#"{ "delta": 0.01, "replications": [] }"#);
        }
        doc.push_str("] } }");

        let first: Vec<_> = read_frames(reader(&doc), 1).take(3).collect().await;
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|frame| frame.is_ok()));
    }
}
