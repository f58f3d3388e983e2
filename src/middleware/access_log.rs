//! One-line request logs rendered from a layout.
//!
//! A layout is plain text with `%(flag)s` placeholders:
//!
//! | Flag | Renders |
//! |---|---|
//! | `status` / `cstatus` | response status, plain / colored |
//! | `latency` / `clatency` | time spent, plain / yellow past 1s, red past 2s |
//! | `ip` | client IP |
//! | `method` / `cmethod` | request method, plain / colored |
//! | `path` | request path |
//! | `fullpath` | path and query |
//! | `header` / `brheader` | request headers as JSON, `br` prefixes a newline |
//! | `body` / `brbody` | request body, `br` prefixes a newline; empty bodies render nothing |
//!
//! Unknown flags render as `(%(flag)s)invalid)` so typos show up in the log.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::LazyLock;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::color::{Color, paint};
use crate::request::Request;

pub const DEFAULT_LAYOUT: &str = "[%(cstatus)s] %(clatency)s %(ip)s %(cmethod)s %(fullpath)s%(brbody)s";
pub const DEFAULT_LAYOUT_WITH_HEADER: &str =
    "[%(cstatus)s] %(clatency)s %(ip)s %(cmethod)s %(fullpath)s%(brheader)s%(brbody)s";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\((.*?)\)s").expect("placeholder pattern is valid"));

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Flag {
    Status,
    CStatus,
    Latency,
    CLatency,
    Ip,
    Method,
    CMethod,
    Path,
    FullPath,
    Header,
    BrHeader,
    Body,
    BrBody,
}

impl Flag {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "status"   => Self::Status,
            "cstatus"  => Self::CStatus,
            "latency"  => Self::Latency,
            "clatency" => Self::CLatency,
            "ip"       => Self::Ip,
            "method"   => Self::Method,
            "cmethod"  => Self::CMethod,
            "path"     => Self::Path,
            "fullpath" => Self::FullPath,
            "header"   => Self::Header,
            "brheader" => Self::BrHeader,
            "body"     => Self::Body,
            "brbody"   => Self::BrBody,
            _          => return None,
        })
    }
}

#[derive(Clone, Debug)]
enum Segment {
    Literal(String),
    Flag(Flag),
    Invalid(String),
}

/// What the access log keeps of a request until its response is ready.
#[derive(Clone, Debug)]
pub struct RequestSummary {
    pub method: Method,
    pub path: String,
    pub full_path: String,
    pub remote_addr: Option<SocketAddr>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A parsed access-log layout.
#[derive(Clone, Debug)]
pub struct AccessLog {
    segments: Vec<Segment>,
    needs_headers: bool,
    needs_body: bool,
}

impl AccessLog {
    pub fn new(layout: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(layout) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(layout[last..whole.start()].to_owned()));
            }
            segments.push(match Flag::parse(name.as_str()) {
                Some(flag) => Segment::Flag(flag),
                None => Segment::Invalid(name.as_str().to_owned()),
            });
            last = whole.end();
        }
        if last < layout.len() {
            segments.push(Segment::Literal(layout[last..].to_owned()));
        }

        let uses = |wanted: &[Flag]| {
            segments.iter().any(|s| matches!(s, Segment::Flag(f) if wanted.contains(f)))
        };
        let needs_headers = uses(&[Flag::Header, Flag::BrHeader]);
        let needs_body = uses(&[Flag::Body, Flag::BrBody]);

        Self { segments, needs_headers, needs_body }
    }

    /// Snapshots the parts of `req` the layout refers to.
    pub fn capture(&self, req: &Request) -> RequestSummary {
        RequestSummary {
            method: req.method().clone(),
            path: req.path().to_owned(),
            full_path: req.full_path().to_owned(),
            remote_addr: req.remote_addr(),
            headers: if self.needs_headers { req.headers().clone() } else { HeaderMap::new() },
            body: if self.needs_body { req.body().clone() } else { Bytes::new() },
        }
    }

    pub fn render(&self, req: &RequestSummary, status: StatusCode, latency: Duration) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Invalid(name) => out.push_str(&format!("(%({name})s)invalid)")),
                Segment::Flag(flag) => out.push_str(&render_flag(*flag, req, status, latency)),
            }
        }
        out
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUT)
    }
}

fn render_flag(flag: Flag, req: &RequestSummary, status: StatusCode, latency: Duration) -> String {
    match flag {
        Flag::Status => status.as_u16().to_string(),
        Flag::CStatus => {
            let code = status.as_u16();
            let text = code.to_string();
            match code {
                0..200 => paint(Color::Blue, &text),
                200..300 => paint(Color::Cyan, &text),
                300..400 => paint(Color::Yellow, &text),
                400..600 => paint(Color::Red, &text),
                _ => text,
            }
        }
        Flag::Latency => format!("{latency:?}"),
        Flag::CLatency => {
            let text = format!("{latency:?}");
            if latency < Duration::from_secs(1) {
                text
            } else if latency < Duration::from_secs(2) {
                paint(Color::Yellow, &text)
            } else {
                paint(Color::Red, &text)
            }
        }
        Flag::Ip => req.remote_addr.map_or_else(|| "-".to_owned(), |addr| addr.ip().to_string()),
        Flag::Method => req.method.to_string(),
        Flag::CMethod => {
            let color = match req.method {
                Method::GET => Color::Cyan,
                Method::POST => Color::Blue,
                Method::DELETE => Color::Red,
                Method::PUT | Method::HEAD | Method::PATCH | Method::OPTIONS => Color::Yellow,
                _ => return req.method.to_string(),
            };
            paint(color, req.method.as_str())
        }
        Flag::Path => req.path.clone(),
        Flag::FullPath => req.full_path.clone(),
        Flag::Header => headers_json(&req.headers),
        Flag::BrHeader => format!("\n{}", headers_json(&req.headers)),
        Flag::Body | Flag::BrBody if req.body.is_empty() => String::new(),
        Flag::Body => String::from_utf8_lossy(&req.body).into_owned(),
        Flag::BrBody => format!("\n{}", String::from_utf8_lossy(&req.body)),
    }
}

/// Headers as an indented JSON object: one value → string, several → array.
fn headers_json(headers: &HeaderMap) -> String {
    let mut map: BTreeMap<&str, Value> = BTreeMap::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = match values.len() {
            1 => values.remove(0),
            _ => Value::Array(values),
        };
        map.insert(name.as_str(), value);
    }

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    match map.serialize(&mut ser) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => String::new(),
    }
}
