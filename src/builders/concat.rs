//! Synchronized multi-stream concatenation.
//!
//! Streams are columns, segments are rows:
//!
//! ```text
//!            stream 0 (video)   stream 1 (audio)
//! segment 0  [v0]               [a0]
//! segment 1  [v1]               [a1]
//! ```
//!
//! renders as `[v0][a0][v1][a1]concat='n=2:v=1:a=1'[_x][_y]`.

use crate::args::Arg;
use crate::error::GraphError;
use crate::graph::{LinkId, MediaType, Operation, Session};
use crate::catalog::Pads;
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct ConcatBuilder {
    streams: Vec<Vec<LinkId>>,
    segments: Option<usize>,
    outputs: Option<Vec<LinkId>>,
}

impl ConcatBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one stream given as its list of segments.
    pub fn add_stream(&mut self, segments: &[LinkId]) -> Result<&mut Self> {
        self.ensure_open()?;
        if segments.is_empty() {
            return Err(GraphError::Structural(
                "concat stream needs at least one segment".to_string(),
            ));
        }
        match self.segments {
            Some(n) if n != segments.len() => {
                return Err(GraphError::Structural(format!(
                    "concat stream has {} segments, expected {}",
                    segments.len(),
                    n
                )));
            }
            _ => self.segments = Some(segments.len()),
        }
        self.streams.push(segments.to_vec());
        Ok(self)
    }

    /// Add one segment given as one pipe per stream.
    pub fn add_segment(&mut self, pipes: &[LinkId]) -> Result<&mut Self> {
        self.ensure_open()?;
        if pipes.is_empty() {
            return Err(GraphError::Structural(
                "concat segment needs at least one stream".to_string(),
            ));
        }
        if self.streams.is_empty() {
            self.streams = vec![Vec::new(); pipes.len()];
        } else if pipes.len() != self.streams.len() {
            return Err(GraphError::Structural(format!(
                "concat segment has {} streams, expected {}",
                pipes.len(),
                self.streams.len()
            )));
        }
        for (stream, &pipe) in self.streams.iter_mut().zip(pipes) {
            stream.push(pipe);
        }
        self.segments = Some(self.segments.unwrap_or(0) + 1);
        Ok(self)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.unwrap_or(0)
    }

    /// Build the concat chain; returns one output per stream, in the order
    /// streams were added. Calling it again returns the same outputs.
    pub fn finalize(&mut self, session: &mut Session) -> Result<Vec<LinkId>> {
        if let Some(outputs) = &self.outputs {
            return Ok(outputs.clone());
        }
        let segments = self.segment_count();
        if self.streams.is_empty() || segments == 0 {
            return Err(GraphError::Structural(
                "concat needs at least one stream with one segment".to_string(),
            ));
        }

        let mut media = Vec::with_capacity(self.streams.len());
        for stream in &self.streams {
            media.push(stream_media(session, stream)?);
        }

        // The concat filter numbers its pads video first, then audio, in
        // every segment; outputs are mapped back to the caller's order below.
        let mut order: Vec<usize> = (0..self.streams.len()).collect();
        order.sort_by_key(|&s| media[s] != MediaType::Video);
        let videos = media.iter().filter(|&&m| m == MediaType::Video).count();
        let audios = media.len() - videos;

        let mut inputs = Vec::with_capacity(segments * self.streams.len());
        for seg in 0..segments {
            for &s in &order {
                inputs.push(self.streams[s][seg]);
            }
        }

        let op = Operation::new("concat")
            .with_args(&[Arg::map([("n", segments), ("v", videos), ("a", audios)])])
            .with_outputs(Pads::Fixed(order.iter().map(|&s| media[s]).collect()));
        let chain = session.start(&inputs)?;
        let chain = session.extend(chain, op)?;
        let produced = session.take_outputs(chain, order.len())?;

        let mut outputs = vec![produced[0]; order.len()];
        for (pad, &s) in order.iter().enumerate() {
            outputs[s] = produced[pad];
        }
        self.outputs = Some(outputs.clone());
        Ok(outputs)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.outputs.is_some() {
            return Err(GraphError::Structural(
                "concat was already finalized".to_string(),
            ));
        }
        Ok(())
    }
}

/// The one media type shared by all segments of a stream.
fn stream_media(session: &mut Session, stream: &[LinkId]) -> Result<MediaType> {
    let mut media = MediaType::Unknown;
    for &pipe in stream {
        let m = session.get_link(pipe)?.media_type();
        if m != MediaType::Unknown {
            media = m;
            break;
        }
    }
    match media {
        MediaType::Video | MediaType::Audio => {}
        MediaType::Unknown => {
            let first = session.get_link(stream[0])?.describe();
            return Err(GraphError::MissingMapping(format!(
                "concat stream starting at {} has unknown media type; \
                 annotate it with an explicit media type (video or audio)",
                first
            )));
        }
        other => {
            return Err(GraphError::MissingMapping(format!(
                "no concat equivalent exists for {} streams",
                other
            )));
        }
    }
    for &pipe in stream {
        session.set_media_type(pipe, media)?;
    }
    Ok(media)
}
