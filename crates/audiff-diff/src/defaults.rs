//! Built-in type handlers.
//!
//! These apply to well-known composite leaf types that must not be walked
//! field by field. They take precedence over caller-registered handlers for
//! the same type.
//!
//! - Timestamps (`chrono` date/time types and their `Option` forms) compare
//!   their UTC rendering truncated to whole seconds, so sub-second precision
//!   and offset representation never show up as changes.
//! - [`Media`] (and `Option<Media>`) compares only the audited fields listed
//!   in [`Media::AUDITED_FIELDS`].

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

use audiff_types::{format_field_by_dot, DiffRecord, Media};

use crate::error::HandlerError;
use crate::handler::{presence, HandlerRegistry, Presence};
use crate::node::Node;

/// Rendering used for timestamp comparisons.
pub const SECONDS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMAT: &str = "%Y-%m-%d";

type Normalize = fn(&str) -> Result<String, HandlerError>;

/// The process-wide default handler registry.
pub fn default_handlers() -> &'static HandlerRegistry {
    static DEFAULTS: OnceLock<HandlerRegistry> = OnceLock::new();
    DEFAULTS.get_or_init(build_defaults)
}

fn build_defaults() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.insert::<DateTime<Utc>, _>(timestamp(offset_seconds));
    registry.insert::<Option<DateTime<Utc>>, _>(timestamp(offset_seconds));
    registry.insert::<DateTime<FixedOffset>, _>(timestamp(offset_seconds));
    registry.insert::<Option<DateTime<FixedOffset>>, _>(timestamp(offset_seconds));
    registry.insert::<DateTime<Local>, _>(timestamp(offset_seconds));
    registry.insert::<Option<DateTime<Local>>, _>(timestamp(offset_seconds));
    registry.insert::<NaiveDateTime, _>(timestamp(naive_seconds));
    registry.insert::<Option<NaiveDateTime>, _>(timestamp(naive_seconds));
    registry.insert::<NaiveDate, _>(timestamp(date_only));
    registry.insert::<Option<NaiveDate>, _>(timestamp(date_only));

    registry.insert::<Media, _>(media);
    registry.insert::<Option<Media>, _>(media);

    registry
}

fn timestamp(
    normalize: Normalize,
) -> impl Fn(&Node, &Node, &str) -> Result<Vec<DiffRecord>, HandlerError> + Send + Sync + 'static
{
    move |old: &Node, new: &Node, path: &str| -> Result<Vec<DiffRecord>, HandlerError> {
        let old = timestamp_side(old, normalize)?;
        let new = timestamp_side(new, normalize)?;
        if old == new {
            return Ok(Vec::new());
        }
        Ok(vec![DiffRecord::new(path, old, new)])
    }
}

fn timestamp_side(node: &Node, normalize: Normalize) -> Result<String, HandlerError> {
    if node.is_empty_optional() {
        return Ok(String::new());
    }
    let node = node.unwrap_optional();
    let text = node
        .as_str()
        .ok_or_else(|| HandlerError::unexpected("timestamp string", node.type_label()))?;
    normalize(text)
}

fn offset_seconds(text: &str) -> Result<String, HandlerError> {
    let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| {
        HandlerError::InvalidValue(format!("{text:?} is not an RFC 3339 timestamp: {e}"))
    })?;
    Ok(parsed.with_timezone(&Utc).format(SECONDS_FORMAT).to_string())
}

fn naive_seconds(text: &str) -> Result<String, HandlerError> {
    let parsed: NaiveDateTime = text.parse().map_err(|e| {
        HandlerError::InvalidValue(format!("{text:?} is not a date-time: {e}"))
    })?;
    Ok(parsed.format(SECONDS_FORMAT).to_string())
}

fn date_only(text: &str) -> Result<String, HandlerError> {
    let parsed: NaiveDate = text
        .parse()
        .map_err(|e| HandlerError::InvalidValue(format!("{text:?} is not a date: {e}")))?;
    Ok(parsed.format(DATE_FORMAT).to_string())
}

fn media(old: &Node, new: &Node, path: &str) -> Result<Vec<DiffRecord>, HandlerError> {
    let (old, new) = match presence(old, new, path) {
        Presence::Neither => return Ok(Vec::new()),
        Presence::OneSided(record) => return Ok(vec![record]),
        Presence::Both(old, new) => (old, new),
    };

    let mut records = Vec::new();
    for field in Media::AUDITED_FIELDS {
        let old_value = media_field(old, field)?;
        let new_value = media_field(new, field)?;
        if old_value != new_value {
            records.push(DiffRecord::new(
                format_field_by_dot(path, field),
                old_value,
                new_value,
            ));
        }
    }
    Ok(records)
}

fn media_field(node: &Node, field: &str) -> Result<String, HandlerError> {
    let media = node
        .as_struct()
        .ok_or_else(|| HandlerError::unexpected("Media", node.type_label()))?;
    media
        .field(field)
        .map(|f| f.value.render())
        .ok_or_else(|| HandlerError::unexpected(format!("Media field `{field}`"), media.name))
}
