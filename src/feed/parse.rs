// src/feed/parse.rs
use anyhow::{bail, Context, Result};
use metrics::{counter, histogram};
use quick_xml::{de::from_str, events::Event, Reader};
use serde::Deserialize;

use crate::model::RawEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

/* ----------------------------
RSS 2.0
---------------------------- */

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // <dc:date>; the deserializer matches on local names.
    date: Option<String>,
    source: Option<TextNode>,
}

/* ----------------------------
Atom
---------------------------- */

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    source: Option<AtomSource>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomSource {
    title: Option<TextNode>,
}

// Element whose attributes we don't care about, e.g. <source url="..">Name</source>.
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

impl TextNode {
    fn into_non_empty(self) -> Option<String> {
        let t = self.text.trim();
        (!t.is_empty()).then(|| t.to_string())
    }
}

/// Parse an RSS 2.0 or Atom document into raw entries, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = escape_unknown_entities(&scrub_html_entities_for_xml(xml));

    let out = match detect_format(&xml_clean)? {
        FeedFormat::Rss => parse_rss(&xml_clean)?,
        FeedFormat::Atom => parse_atom(&xml_clean)?,
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("news_feed_parse_ms").record(ms);
    counter!("news_feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

/// Look at the document's root element to tell RSS from Atom.
pub fn detect_format(xml: &str) -> Result<FeedFormat> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("reading feed root element")? {
            Event::Start(e) | Event::Empty(e) => {
                return match e.local_name().as_ref() {
                    b"rss" => Ok(FeedFormat::Rss),
                    b"feed" => Ok(FeedFormat::Atom),
                    other => bail!(
                        "unsupported feed root element <{}>",
                        String::from_utf8_lossy(other)
                    ),
                };
            }
            Event::Eof => bail!("feed document has no root element"),
            _ => {}
        }
    }
}

fn parse_rss(xml: &str) -> Result<Vec<RawEntry>> {
    let rss: Rss = from_str(xml).context("parsing rss xml")?;
    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| RawEntry {
            title: it.title,
            link: it.link,
            published: it.pub_date.or(it.date),
            source: it.source.and_then(TextNode::into_non_empty),
        })
        .collect())
}

fn parse_atom(xml: &str) -> Result<Vec<RawEntry>> {
    let feed: AtomFeed = from_str(xml).context("parsing atom xml")?;
    Ok(feed
        .entry
        .into_iter()
        .map(|e| {
            let link = pick_atom_link(&e.links);
            RawEntry {
                title: e.title.map(|t| t.text),
                link,
                published: e.published.or(e.updated),
                source: e
                    .source
                    .and_then(|s| s.title)
                    .and_then(TextNode::into_non_empty),
            }
        })
        .collect())
}

// Prefer rel="alternate" (or no rel, which means the same), else the first href.
fn pick_atom_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|l| l.href.clone())
}

// HTML named entities that are not predefined in XML and break the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

// Any other `&` that does not start an XML reference is escaped, so an
// unlisted entity such as `&eacute;` survives as literal text instead of
// failing the whole document. CDATA sections are copied untouched.
fn escape_unknown_entities(s: &str) -> String {
    const CDATA_OPEN: &str = "<![CDATA[";

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find(['&', '<']) {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        if let Some(body) = rest.strip_prefix(CDATA_OPEN) {
            let end = body
                .find("]]>")
                .map_or(rest.len(), |e| CDATA_OPEN.len() + e + "]]>".len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }
        if rest.starts_with('<') {
            out.push('<');
        } else if is_xml_reference(&rest[1..]) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

fn is_xml_reference(after_amp: &str) -> bool {
    let Some(end) = after_amp.find(';') else {
        return false;
    };
    let name = &after_amp[..end];
    match name.strip_prefix('#') {
        Some(num) => match num.strip_prefix('x') {
            Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
            None => !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()),
        },
        None => matches!(name, "amp" | "lt" | "gt" | "quot" | "apos"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_rss_and_atom_roots() {
        let rss = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        let atom = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;
        assert_eq!(detect_format(rss).unwrap(), FeedFormat::Rss);
        assert_eq!(detect_format(atom).unwrap(), FeedFormat::Atom);
        assert!(detect_format("<html><body/></html>").is_err());
        assert!(detect_format("").is_err());
    }

    #[test]
    fn rss_channel_without_items_is_empty() {
        let xml = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn rss_item_source_and_entities() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
              <title>Hello&nbsp;world &amp; more</title>
              <link>https://example.test/1</link>
              <pubDate>Wed, 03 Jan 2024 08:00:00 GMT</pubDate>
              <source url="https://paper.test">Daily Paper</source>
            </item>
            <item>
              <title>No source</title>
              <link>https://example.test/2</link>
            </item>
        </channel></rss>"#;
        let out = parse_feed(xml).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title.as_deref(), Some("Hello world & more"));
        assert_eq!(out[0].source.as_deref(), Some("Daily Paper"));
        assert_eq!(
            out[0].published.as_deref(),
            Some("Wed, 03 Jan 2024 08:00:00 GMT")
        );
        assert_eq!(out[1].source, None);
        assert_eq!(out[1].published, None);
    }

    #[test]
    fn rss_item_dated_only_by_dc_date() {
        let xml = r#"<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"><channel>
            <item>
              <title>Wire story</title>
              <link>https://example.test/dc</link>
              <dc:date>2024-01-03T00:00:00Z</dc:date>
            </item>
        </channel></rss>"#;
        let out = parse_feed(xml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].published.as_deref(), Some("2024-01-03T00:00:00Z"));
    }

    #[test]
    fn unlisted_html_entity_keeps_the_entry() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
              <title>Caf&eacute; chain expands</title>
              <link>https://example.test/cafe?a=1&b=2</link>
              <pubDate>Wed, 03 Jan 2024 08:00:00 GMT</pubDate>
            </item>
            <item>
              <title><![CDATA[AT&T &amp; friends]]></title>
              <link>https://example.test/att</link>
            </item>
        </channel></rss>"#;
        let out = parse_feed(xml).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title.as_deref(), Some("Caf&eacute; chain expands"));
        assert_eq!(out[0].link.as_deref(), Some("https://example.test/cafe?a=1&b=2"));
        assert_eq!(out[1].title.as_deref(), Some("AT&T &amp; friends"));
    }

    #[test]
    fn xml_references_are_left_alone() {
        assert_eq!(
            escape_unknown_entities("a &amp; b &#39; &#x4E2D; &lt;x&gt; &copy; & c"),
            "a &amp; b &#39; &#x4E2D; &lt;x&gt; &amp;copy; &amp; c"
        );
    }

    #[test]
    fn atom_prefers_alternate_link_and_falls_back_to_updated() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <title>f</title>
            <entry>
              <title type="text">Atom one</title>
              <link rel="self" href="https://example.test/self"/>
              <link rel="alternate" href="https://example.test/alt"/>
              <updated>2024-01-04T09:00:00Z</updated>
              <source><title>Wire</title></source>
            </entry>
        </feed>"#;
        let out = parse_feed(xml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title.as_deref(), Some("Atom one"));
        assert_eq!(out[0].link.as_deref(), Some("https://example.test/alt"));
        assert_eq!(out[0].published.as_deref(), Some("2024-01-04T09:00:00Z"));
        assert_eq!(out[0].source.as_deref(), Some("Wire"));
    }
}
