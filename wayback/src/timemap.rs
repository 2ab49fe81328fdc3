// Parser for the memento link-format served by the Wayback Machine at
// /web/timemap/link/<url>, as described at
// http://ws-dl.blogspot.com/2013/07/2013-07-15-wayback-machine-upgrades.html.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Method;
use serde::Serialize;
use tracing::{error, warn};

use crate::client::Client;
use crate::error::{Error, Result};

fn outer_split_expr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<(.*)>; (.*),$").unwrap())
}

fn tail_split_expr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" *; *").unwrap())
}

fn tail_parse_expr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([^=]+)="([^"]*)""#).unwrap())
}

/// One archived-page reference from a timemap record.
///
/// Which optional fields are present depends on the record's `rel` kind:
/// `self` records carry `mime_type` and `from`, `memento`/`first memento`
/// records carry the capture `time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memento {
    pub url: String,
    pub rel: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

/// The archived history of one URL: its original location, the timemap
/// itself, the timegate, and every recorded capture in input order (which
/// is not necessarily chronological).
#[derive(Debug, Default, Serialize)]
pub struct TimeMap {
    pub original: Option<Memento>,
    #[serde(rename = "self")]
    pub self_: Option<Memento>,
    pub timegate: Option<Memento>,
    pub mementos: Vec<Memento>,
}

/// Attribute timestamp shape, e.g. `Sat, 31 Mar 2001 11:48:39 GMT`.
fn parse_attr_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Parse a single timemap line of the shape
/// `<URL>; key1="v1"; key2="v2",`.
///
/// Tail pieces that are not `key="value"`, and unrecognized keys, are
/// logged and skipped. A line that does not match the outer envelope, or a
/// recognized timestamp attribute that does not parse, fails the line.
pub fn parse_memento(line: &str) -> Result<Memento> {
    let pieces = outer_split_expr()
        .captures(line)
        .ok_or_else(|| parse_error(line))?;

    let mut memento = Memento {
        url: pieces[1].to_string(),
        rel: String::new(),
        mime_type: None,
        from: None,
        time: None,
    };

    for piece in tail_split_expr().split(&pieces[2]) {
        let Some(attr) = tail_parse_expr().captures(piece) else {
            warn!("unexpected input, unrecognized tail piece {piece:?} (line={line:?})");
            continue;
        };

        let value = &attr[2];
        match &attr[1] {
            "rel" => memento.rel = value.to_string(),

            "type" => memento.mime_type = Some(value.to_string()),

            "from" => match parse_attr_time(value) {
                Some(t) => memento.from = Some(t),
                None => {
                    error!("bad 'from' timestamp {value:?}");
                    return Err(parse_error(line));
                }
            },

            "datetime" => match parse_attr_time(value) {
                Some(t) => memento.time = Some(t),
                None => {
                    error!("bad 'datetime' timestamp {value:?}");
                    return Err(parse_error(line));
                }
            },

            key => warn!("unexpected input, unrecognized memento field {key:?} (line={line:?})"),
        }
    }

    Ok(memento)
}

/// Parse a complete timemap response body.
///
/// Pure, no I/O. Blank lines are skipped; any malformed line fails the
/// whole parse with the 1-based line number, since a broken envelope means
/// the rest of the payload cannot be trusted either.
pub fn parse_timemap(input: &str) -> Result<TimeMap> {
    let mut timemap = TimeMap::default();

    for (index, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let memento = parse_memento(line).map_err(|err| err.at_line(index + 1))?;

        let rel = memento.rel.clone();
        match rel.as_str() {
            "memento" | "first memento" => timemap.mementos.push(memento),

            "timegate" => timemap.timegate = Some(memento),

            "self" => timemap.self_ = Some(memento),

            "original" => timemap.original = Some(memento),

            "" => warn!("dropping record with no rel attribute (line {})", index + 1),

            rel => {
                error!("no handler for memento rel value {rel:?}");
                return Err(Error::Parse {
                    line: index + 1,
                    raw: line.to_string(),
                });
            }
        }
    }

    Ok(timemap)
}

impl Client {
    /// Download and parse the timemap describing the archived history of
    /// `url`.
    pub fn timemap_for(&self, url: &str) -> Result<TimeMap> {
        let timemap_url = format!("{}/web/timemap/link/{}", self.config.base_url, url);

        let response = self.do_request(Method::GET, &timemap_url, None)?;
        if !response.status.is_success() {
            return Err(Error::HttpStatus {
                url: timemap_url,
                status: response.status.as_u16(),
            });
        }

        let body = String::from_utf8_lossy(&response.body);
        parse_timemap(&body)
    }
}

fn parse_error(raw: &str) -> Error {
    Error::Parse {
        line: 0,
        raw: raw.to_string(),
    }
}
