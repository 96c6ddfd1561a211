//! Item extraction from raw RSS/Atom bodies.
//!
//! Feeds in the wild are frequently not well-formed XML, so parsing is
//! deliberately forgiving:
//!
//! - bare `&` and `<` characters are escaped before the reader sees them
//! - mismatched end tags are tolerated
//! - entity references are kept verbatim and decoded against a fixed table
//! - each item is read by its own reader, so a hard parse error only ends
//!   that item; fields completed before the error are kept
//!
//! Field priorities:
//!
//! | Field | Source |
//! |-------|--------|
//! | title | CDATA content of the first `<title>`, else its text |
//! | link  | first `<link>` text, else Atom `<link href>` (no `rel` or `rel="alternate"`) |
//! | date  | `pubDate`, `published`, `updated`, `dc:date` |
//! | image | `media:content@url`, image `enclosure@url`, first `<img src>` in the item HTML |

use crate::config::ImageSettings;
use crate::models::{Article, FeedPayload};
use crate::utils::source_name;
use chrono::DateTime;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::borrow::Cow;
use tracing::{debug, instrument};

static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[0-9]+|[A-Za-z]+);").unwrap());

static AMPERSAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+;|#x[0-9A-Fa-f]+;|[A-Za-z][A-Za-z0-9]*;)?").unwrap());

static ANGLE_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([A-Za-z_:/!?])?").unwrap());

static ITEM_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(?:item|entry)[\s>/]").unwrap());

const DATE_TAGS: [&str; 4] = ["pubDate", "published", "updated", "dc:date"];

/// One item as found in the feed, before any filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Milliseconds since the Unix epoch, when a date parsed.
    pub date: Option<i64>,
    pub image: Option<String>,
}

/// Decode the fixed entity table in a single pass.
///
/// Covers the XML five, their numeric forms, curly quotes and `&nbsp;`.
///
/// # Arguments
///
/// * `text` - Text that may contain entity references
///
/// # Returns
///
/// The decoded text. Unknown entities are left untouched and the output of
/// one replacement is never decoded again, so `&amp;lt;` becomes `&lt;`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(decode_entities("AT&amp;T&#8217;s"), "AT&T's");
/// ```
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let decoded = match &caps[1] {
                "amp" | "#38" => "&",
                "lt" | "#60" => "<",
                "gt" | "#62" => ">",
                "quot" | "#34" => "\"",
                "apos" | "#39" => "'",
                "lsquo" | "#8216" | "rsquo" | "#8217" => "'",
                "ldquo" | "#8220" | "rdquo" | "#8221" => "\"",
                "nbsp" | "#160" => " ",
                _ => return caps[0].to_string(),
            };
            decoded.to_string()
        })
        .into_owned()
}

/// Escape every `&` that does not start an entity reference.
fn repair_ampersands(body: &str) -> Cow<'_, str> {
    AMPERSAND.replace_all(body, |caps: &Captures| match caps.get(1) {
        Some(_) => caps[0].to_string(),
        None => "&amp;".to_string(),
    })
}

/// Escape every `<` that cannot open a tag, as in `yields < 5%`.
fn repair_angle_brackets(body: &str) -> Cow<'_, str> {
    ANGLE_BRACKET.replace_all(body, |caps: &Captures| match caps.get(1) {
        Some(_) => caps[0].to_string(),
        None => "&lt;".to_string(),
    })
}

/// Parse a feed timestamp into epoch milliseconds.
///
/// # Arguments
///
/// * `raw` - RFC 2822 (`pubDate`) or RFC 3339 (Atom) text, surrounding
///   whitespace allowed
///
/// # Returns
///
/// `Some(ms)` for either format, `None` otherwise.
pub fn parse_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.timestamp_millis())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Date,
    Html,
}

fn field_for(name: &str) -> Option<Field> {
    match name {
        "title" => Some(Field::Title),
        "link" => Some(Field::Link),
        "description" | "content:encoded" | "content" | "summary" => Some(Field::Html),
        n if DATE_TAGS.contains(&n) => Some(Field::Date),
        _ => None,
    }
}

/// Text collected for the element currently being captured.
#[derive(Debug)]
struct Capture {
    element: String,
    field: Field,
    text: String,
    cdata: String,
}

/// Accumulates one `<item>`/`<entry>` while its events stream past.
#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    atom_link: Option<String>,
    dates: Vec<(String, String)>,
    html: String,
    media_image: Option<String>,
    enclosure_image: Option<String>,
    inline_image: Option<String>,
    capture: Option<Capture>,
}

impl ItemBuilder {
    /// Inspect attributes of any element inside the item.
    fn attributes(&mut self, name: &str, e: &BytesStart) {
        match name {
            "media:content" if self.media_image.is_none() => {
                self.media_image = attr(e, "url");
            }
            "enclosure" if self.enclosure_image.is_none() => {
                let is_image = attr(e, "type").is_some_and(|t| t.starts_with("image/"));
                if is_image {
                    self.enclosure_image = attr(e, "url");
                }
            }
            "link" if self.atom_link.is_none() => {
                let rel = attr(e, "rel");
                if rel.is_none() || rel.as_deref() == Some("alternate") {
                    self.atom_link = attr(e, "href").filter(|h| !h.trim().is_empty());
                }
            }
            "img" if self.inline_image.is_none() => {
                self.inline_image = attr(e, "src");
            }
            _ => {}
        }
    }

    fn open(&mut self, name: &str) {
        if self.capture.is_some() {
            return;
        }
        if let Some(field) = field_for(name) {
            self.capture = Some(Capture {
                element: name.to_string(),
                field,
                text: String::new(),
                cdata: String::new(),
            });
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn cdata(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.cdata.push_str(text);
        }
    }

    fn close(&mut self, name: &str) {
        let Some(capture) = self.capture.take_if(|c| c.element == name) else {
            return;
        };
        match capture.field {
            Field::Title if self.title.is_none() => {
                let raw = if capture.cdata.trim().is_empty() {
                    &capture.text
                } else {
                    &capture.cdata
                };
                let title = decode_entities(raw).trim().to_string();
                if !title.is_empty() {
                    self.title = Some(title);
                }
            }
            Field::Link if self.link.is_none() => {
                let link = format!("{}{}", capture.cdata, capture.text);
                let link = decode_entities(link.trim());
                if !link.is_empty() {
                    self.link = Some(link);
                }
            }
            Field::Date => {
                let value = format!("{}{}", capture.cdata, capture.text);
                self.dates.push((capture.element, value));
            }
            Field::Html => {
                self.html.push_str(&capture.cdata);
                self.html.push_str(&decode_entities(&capture.text));
                self.html.push('\n');
            }
            _ => {}
        }
    }

    fn finish(self) -> RawItem {
        let date = DATE_TAGS.iter().find_map(|tag| {
            self.dates
                .iter()
                .filter(|(name, _)| name == tag)
                .find_map(|(_, value)| parse_date(value))
        });
        let image = self
            .media_image
            .or(self.enclosure_image)
            .or(self.inline_image)
            .or_else(|| first_img_src(&self.html))
            .map(|src| src.trim().to_string())
            .filter(|src| !src.is_empty());
        RawItem {
            title: self.title,
            link: self.link.or(self.atom_link.map(|l| l.trim().to_string())),
            date,
            image,
        }
    }
}

fn attr(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .map(|a| decode_entities(&String::from_utf8_lossy(&a.value)))
}

fn first_img_src(html: &str) -> Option<String> {
    if !html.contains("<img") {
        return None;
    }
    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .find_map(|img| img.value().attr("src"))
        .map(str::to_string)
}

fn is_item(name: &str) -> bool {
    name == "item" || name == "entry"
}

/// Scan a feed body for items.
///
/// The body is cut at every `<item>`/`<entry>` start tag and each piece is
/// read on its own, so broken markup only costs the item it appears in.
///
/// # Arguments
///
/// * `body` - Raw feed text, well-formed or not
///
/// # Returns
///
/// One [`RawItem`] per item record, in document order. Fields that could not
/// be recovered are `None`.
pub fn parse_items(body: &str) -> Vec<RawItem> {
    let escaped = repair_ampersands(body);
    let repaired = repair_angle_brackets(&escaped);
    let starts: Vec<usize> = ITEM_START.find_iter(&repaired).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(repaired.len());
            parse_item(&repaired[start..end])
        })
        .collect()
}

/// Read a single item from a chunk that starts at its opening tag.
fn parse_item(chunk: &str) -> Option<RawItem> {
    let mut reader = Reader::from_str(chunk);
    reader.config_mut().check_end_names = false;

    let mut current: Option<ItemBuilder> = None;
    // Elements open inside the item
    let mut stack: Vec<String> = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    "Item markup broken; keeping the fields read so far"
                );
                break;
            }
        };
        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match current.as_mut() {
                    Some(item) => {
                        item.attributes(&name, &e);
                        item.open(&name);
                        stack.push(name);
                    }
                    None if is_item(&name) => current = Some(ItemBuilder::default()),
                    None => {}
                }
            }
            Event::Empty(e) => {
                if let Some(item) = current.as_mut() {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    item.attributes(&name, &e);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if is_item(&name) {
                    break;
                }
                if let Some(item) = current.as_mut() {
                    // Unmatched end tags are ignored; a match closes everything above it
                    if let Some(pos) = stack.iter().rposition(|open| *open == name) {
                        for closed in stack.drain(pos..).rev() {
                            item.close(&closed);
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(item) = current.as_mut() {
                    item.text(&String::from_utf8_lossy(&t));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(item) = current.as_mut() {
                    item.text(&format!("&{};", String::from_utf8_lossy(&r)));
                }
            }
            Event::CData(c) => {
                if let Some(item) = current.as_mut() {
                    item.cdata(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut item = current?;
    // Truncated items keep whatever was still open
    for closed in stack.drain(..).rev() {
        item.close(&closed);
    }
    Some(item.finish())
}

/// Deterministic generated-image URL for a title.
///
/// # Arguments
///
/// * `endpoint` - Prefix of the image service, e.g. `https://image.pollinations.ai/prompt/`
/// * `title` - Article title, percent-encoded into the path
///
/// # Returns
///
/// `"{endpoint}{encoded title}"`.
pub fn fallback_image(endpoint: &str, title: &str) -> String {
    format!("{}{}", endpoint, urlencoding::encode(title))
}

/// Turn one feed payload into articles.
///
/// Items without a title or link are dropped silently; a missing or
/// unparseable date becomes `now_ms`.
///
/// # Arguments
///
/// * `payload` - Fetched feed; a `None` body yields nothing
/// * `images` - Whether and how to attach images
/// * `now_ms` - Timestamp used for undated items
///
/// # Returns
///
/// Articles in feed order, tagged with the feed's display name and URL.
#[instrument(level = "debug", skip_all, fields(url = %payload.source.url))]
pub fn extract_articles(payload: &FeedPayload, images: &ImageSettings, now_ms: i64) -> Vec<Article> {
    let Some(body) = payload.body.as_deref() else {
        return Vec::new();
    };
    let source = payload
        .source
        .name
        .clone()
        .or_else(|| source_name(&payload.source.url));

    let raw_items = parse_items(body);
    let found = raw_items.len();
    let articles: Vec<Article> = raw_items
        .into_iter()
        .filter_map(|item| {
            let (title, link) = (item.title?, item.link?);
            let (image, ai_image) = if images.enabled {
                let generated = fallback_image(&images.fallback_endpoint, &title);
                (item.image.or(Some(generated.clone())), Some(generated))
            } else {
                (None, None)
            };
            Some(Article {
                title,
                link,
                date: item.date.unwrap_or(now_ms),
                source: source.clone(),
                source_url: Some(payload.source.url.clone()),
                image,
                ai_image,
            })
        })
        .collect();

    debug!(found, kept = articles.len(), "Extracted feed items");
    articles
}
