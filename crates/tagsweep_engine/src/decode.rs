use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use sweep_logging::sweep_warn;

use crate::ClassifyError;

/// Decode a response body to UTF-8.
///
/// Encoding is picked from the BOM, then the `Content-Type` charset, then a
/// chardetng guess. Malformed byte sequences become U+FFFD; only a body with
/// nothing but replacement characters is a `ParseError`.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, ClassifyError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        if text
            .chars()
            .all(|c| c == char::REPLACEMENT_CHARACTER || c.is_whitespace())
        {
            return Err(ClassifyError::ParseError(format!(
                "body is not valid {}",
                encoding.name()
            )));
        }
        sweep_warn!(
            "Body had malformed {} sequences; decoded with replacements",
            encoding.name()
        );
    }
    Ok(text.into_owned())
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]))
    })
}
