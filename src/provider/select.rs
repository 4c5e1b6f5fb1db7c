//! Stream ordering and selection applied before the user picks a quality.

use crate::error::{Error, Result};
use crate::provider::types::StreamDescriptor;

/// Drop unlabeled streams and sort the rest ascending by resolution.
///
/// Streams without a parseable resolution sort first; ties keep their order.
pub fn order_streams(streams: Vec<StreamDescriptor>) -> Vec<StreamDescriptor> {
    let mut ordered: Vec<_> = streams.into_iter().filter(|s| s.has_label()).collect();
    ordered.sort_by_key(|s| s.resolution());
    ordered
}

/// Pick a stream by label, or the best (last) one when no label is given.
pub fn pick_stream<'a>(
    streams: &'a [StreamDescriptor],
    quality: Option<&str>,
) -> Result<&'a StreamDescriptor> {
    match quality {
        Some(label) => streams
            .iter()
            .find(|s| s.quality_label.eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| {
                let available: Vec<_> = streams.iter().map(|s| s.quality_label.as_str()).collect();
                Error::NoStreams(format!(
                    "quality '{}' not offered (available: {})",
                    label,
                    available.join(", ")
                ))
            }),
        None => streams
            .last()
            .ok_or_else(|| Error::NoStreams("no labeled streams to choose from".into())),
    }
}
