use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// One part of a `multipart/form-data` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPart {
    /// Field name from `Content-Disposition`.
    pub name: String,
    /// Client file name, present for file fields.
    pub file_name: Option<String>,
    /// Part content type, if sent.
    pub content_type: Option<String>,
    /// Raw part body.
    pub data: Vec<u8>,
}

/// Parsed `multipart/form-data` body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    /// Parts in body order.
    pub parts: Vec<FormPart>,
}

impl FormData {
    /// Parse `body` using the boundary announced in `content_type`.
    pub fn parse(content_type: &str, body: &[u8]) -> PhotoframeResult<Self> {
        let boundary = boundary_from_content_type(content_type)?;
        Ok(Self {
            parts: parse_parts(body, &boundary)?,
        })
    }

    /// First part named `name`.
    pub fn field(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// First part named `name` that is non-empty, as UTF-8 text.
    pub fn text(&self, name: &str) -> Option<String> {
        let part = self.field(name)?;
        let text = String::from_utf8_lossy(&part.data).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Extract the `boundary` parameter of a `multipart/form-data` content type.
pub fn boundary_from_content_type(content_type: &str) -> PhotoframeResult<String> {
    let mut params = content_type.split(';');
    let mime = params.next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(PhotoframeError::bad_input(format!(
            "expected multipart/form-data, got '{mime}'"
        )));
    }
    params
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| PhotoframeError::bad_input("multipart content type has no boundary"))
}

fn find(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > hay.len() || needle.is_empty() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn skip_line_break(body: &[u8], at: usize) -> usize {
    if body[at..].starts_with(b"\r\n") {
        at + 2
    } else if body[at..].starts_with(b"\n") {
        at + 1
    } else {
        at
    }
}

fn parse_parts(body: &[u8], boundary: &str) -> PhotoframeResult<Vec<FormPart>> {
    let delimiter = format!("--{boundary}").into_bytes();
    let separator = format!("\r\n--{boundary}").into_bytes();
    let malformed = || PhotoframeError::bad_input("malformed multipart body");

    let mut cursor = find(body, &delimiter, 0).ok_or_else(malformed)? + delimiter.len();
    let mut parts = Vec::new();
    loop {
        if body[cursor..].starts_with(b"--") {
            return Ok(parts);
        }
        cursor = skip_line_break(body, cursor);

        let header_end = find(body, b"\r\n\r\n", cursor).ok_or_else(malformed)?;
        let headers = std::str::from_utf8(&body[cursor..header_end])
            .map_err(|_| PhotoframeError::bad_input("multipart headers are not UTF-8"))?;
        let data_start = header_end + 4;
        let data_end = find(body, &separator, data_start).ok_or_else(malformed)?;

        let mut part = parse_part_headers(headers)?;
        part.data = body[data_start..data_end].to_vec();
        parts.push(part);

        cursor = data_end + separator.len();
    }
}

fn parse_part_headers(headers: &str) -> PhotoframeResult<FormPart> {
    let mut name = None;
    let mut file_name = None;
    let mut content_type = None;

    for line in headers.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                let Some((k, v)) = param.split_once('=') else {
                    continue;
                };
                let v = v.trim().trim_matches('"').to_string();
                match k.trim().to_ascii_lowercase().as_str() {
                    "name" => name = Some(v),
                    "filename" => file_name = Some(v),
                    _ => {}
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name = name
        .ok_or_else(|| PhotoframeError::bad_input("multipart part without a field name"))?;
    Ok(FormPart {
        name,
        file_name,
        content_type,
        data: Vec::new(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/service/multipart.rs"]
mod tests;
