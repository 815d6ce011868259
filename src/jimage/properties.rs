use super::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write;

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
<!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">\n";

/// Configuration a decompressor was created with
///
/// When a compressor is configured, its settings are stored in the image string table using the
/// XML properties format of `java.util.Properties`:
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8" standalone="no"?>
/// <!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">
/// <properties>
/// <entry key="zip-level">9</entry>
/// </properties>
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Properties {
        Properties(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Parse an XML property set
    ///
    /// Only the subset of XML that property files use is understood: a `properties` element
    /// containing an optional `comment` and `entry` elements, plus comments. The prolog and
    /// doctype are skipped without validation.
    pub fn from_xml(xml: &str) -> Result<Properties> {
        let mut properties = Properties::new();

        let start = xml
            .find("<properties")
            .ok_or_else(|| invalid("missing <properties> element"))?;
        let (open_tag, mut rest) = split_tag(&xml[start..])?;
        if open_tag.ends_with('/') {
            return Ok(properties);
        }

        loop {
            rest = rest.trim_start();
            if rest.starts_with("</properties") {
                return Ok(properties);
            } else if let Some(comment) = rest.strip_prefix("<!--") {
                let end = comment
                    .find("-->")
                    .ok_or_else(|| invalid("unterminated comment"))?;
                rest = &comment[end + 3..];
            } else if rest.starts_with("<comment") {
                let (tag, after) = split_tag(rest)?;
                rest = if tag.ends_with('/') {
                    after
                } else {
                    let (_, after) = element_text(after, "</comment>")?;
                    after
                };
            } else if rest.starts_with("<entry") {
                let (tag, after) = split_tag(rest)?;
                let (attributes, empty) = match tag.strip_suffix('/') {
                    Some(attributes) => (attributes, true),
                    None => (tag, false),
                };
                let key = attribute(&attributes["entry".len()..], "key")
                    .ok_or_else(|| invalid("entry without a key"))?;
                let key = unescape(key)?;
                let value = if empty {
                    rest = after;
                    String::new()
                } else {
                    let (text, after) = element_text(after, "</entry>")?;
                    rest = after;
                    unescape(text)?
                };
                properties.set(key, value);
            } else if rest.is_empty() {
                return Err(invalid("unterminated <properties> element"));
            } else {
                let snippet: String = rest.chars().take(20).collect();
                return Err(invalid(&format!("unexpected content '{}'", snippet)));
            }
        }
    }

    /// Serialize to the XML property set format
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(XML_HEADER);
        xml.push_str("<properties>\n");
        for (key, value) in &self.0 {
            let _ = writeln!(xml, "<entry key=\"{}\">{}</entry>", escape(key), escape(value));
        }
        xml.push_str("</properties>\n");
        xml
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidProperties(msg.to_owned())
}

/// Split `<tag ...>rest` into the inside of the tag and what follows it
fn split_tag(source: &str) -> Result<(&str, &str)> {
    let end = source
        .find('>')
        .ok_or_else(|| invalid("unterminated tag"))?;
    Ok((source[1..end].trim_end(), &source[end + 1..]))
}

/// Split `text</closing>rest` into the text and what follows the closing tag
fn element_text<'a>(source: &'a str, closing: &str) -> Result<(&'a str, &'a str)> {
    let end = source
        .find(closing)
        .ok_or_else(|| invalid(&format!("missing {}", closing)))?;
    Ok((&source[..end], &source[end + closing.len()..]))
}

/// Find a quoted attribute value among `name="value"` pairs
fn attribute<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = attributes.trim_start();
    while !rest.is_empty() {
        let equals = rest.find('=')?;
        let attribute_name = rest[..equals].trim();
        let after = rest[equals + 1..].trim_start();
        let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let close = after[1..].find(quote)?;
        if attribute_name == name {
            return Some(&after[1..close + 1]);
        }
        rest = after[close + 2..].trim_start();
    }
    None
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let semi = rest[amp..]
            .find(';')
            .ok_or_else(|| invalid("unterminated character reference"))?;
        let entity = &rest[amp + 1..amp + semi];
        let c = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| invalid(&format!("unknown entity '&{};'", entity)))?
            }
        };
        out.push(c);
        rest = &rest[amp + semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {
                let _ = write!(out, "&#{};", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_java_output() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
            <!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">\n\
            <properties>\n\
            <comment>written by jlink</comment>\n\
            <entry key=\"zip-level\">9</entry>\n\
            <!-- a comment -->\n\
            <entry key='filter'>*.class</entry>\n\
            <entry key=\"empty\"/>\n\
            </properties>\n";
        let properties = Properties::from_xml(xml).unwrap();
        assert_eq!(properties.len(), 3);
        assert_eq!(properties.get("zip-level"), Some("9"));
        assert_eq!(properties.get("filter"), Some("*.class"));
        assert_eq!(properties.get("empty"), Some(""));
        assert_eq!(properties.get("missing"), None);
    }

    #[test]
    fn empty_property_sets() {
        assert!(Properties::from_xml("<properties/>").unwrap().is_empty());
        assert!(Properties::from_xml("<properties>\n</properties>")
            .unwrap()
            .is_empty());
        assert!(Properties::from_xml(&Properties::new().to_xml())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn escapes_round_trip() {
        let mut properties = Properties::new();
        properties.set("a<b", "x & \"y\" > 'z'");
        properties.set("tab", "1\t2");
        properties.set("unicode", "caf\u{e9}");
        let xml = properties.to_xml();
        assert!(xml.contains(
            "<entry key=\"a&lt;b\">x &amp; &quot;y&quot; &gt; &apos;z&apos;</entry>"
        ));
        assert_eq!(Properties::from_xml(&xml).unwrap(), properties);
    }

    #[test]
    fn numeric_references() {
        let properties =
            Properties::from_xml("<properties><entry key=\"k\">&#65;&#x42;</entry></properties>")
                .unwrap();
        assert_eq!(properties.get("k"), Some("AB"));
    }

    #[test]
    fn rejects_garbage() {
        for xml in [
            "",
            "<props/>",
            "<properties>",
            "<properties><entry>v</entry></properties>",
            "<properties><entry key=\"k\">v</properties>",
            "<properties><entry key=\"k\">&bogus;</entry></properties>",
            "<properties>text</properties>",
        ] {
            assert!(
                matches!(Properties::from_xml(xml), Err(Error::InvalidProperties(_))),
                "accepted {:?}",
                xml
            );
        }
    }
}
