use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading the `data` payloads of server-sent events from a
/// chunk stream.
pub struct Sse {
    buf: String,
    // Trailing bytes of a UTF-8 sequence split across two chunks.
    pending_bytes: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            pending_bytes: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Events already buffered are returned before reading more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.pending_bytes.extend_from_slice(bytes);
        let valid_len = match str::from_utf8(&self.pending_bytes) {
            Ok(s) => s.len(),
            // An incomplete sequence at the end, wait for the next chunk.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.pending_bytes.split_off(valid_len);
        let valid = std::mem::replace(&mut self.pending_bytes, rest);
        let Ok(s) = String::from_utf8(valid) else {
            return Err(Error::InvalidPayload);
        };
        self.buf.push_str(&s);

        // Gemini ends lines with CRLF. A lone CR left at the end of the
        // buffer is joined with the LF of the next chunk here.
        if self.buf.contains("\r\n") {
            self.buf = self.buf.replace("\r\n", "\n");
        }
        Ok(())
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // event       = *( comment / field ) end-of-line
        // comment     = colon *any-char end-of-line
        // field       = 1*name-char [ colon [ space ] *any-char ] end-of-line
        //
        // Only `data` fields are collected; `event`, `id` and `retry` are
        // accepted and ignored. Blocks without data are skipped.
        loop {
            let Some(eol_idx) = self.buf.find("\n\n") else {
                return Ok(None);
            };

            let mut data: Option<String> = None;
            for line in self.buf[0..eol_idx].split('\n') {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let Some((name, value)) = line.split_once(':') else {
                    return Err(Error::InvalidPayload);
                };
                if name != "data" {
                    continue;
                }
                let value = value.strip_prefix(' ').unwrap_or(value);
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            // Consume the bytes from the buffer.
            self.buf.drain(0..eol_idx + 2);

            if data.is_some() {
                return Ok(data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_of(chunks: &[&'static [u8]]) -> Sse {
        let chunks = chunks.iter().map(|c| Bytes::from_static(c)).collect();
        Sse::new(Chunks::from_vec_deque(chunks))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_of(&[b"data: hello\n\n", b"data: bye\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_several_events_in_one_chunk() {
        let mut sse = sse_of(&[b"data: a\n\ndata: b\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "a");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "b");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_crlf_split_across_chunks() {
        let mut sse = sse_of(&[b"data: {\"a\":1}\r", b"\n\r\n", b"data:x\r\n\r\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "{\"a\":1}");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "x");
    }

    #[tokio::test]
    async fn test_utf8_split_across_chunks() {
        // "G'day 👋" with the emoji cut in half.
        let mut sse = sse_of(&[b"data: G'day \xF0\x9F", b"\x91\x8B\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "G'day 👋");
    }

    #[tokio::test]
    async fn test_comments_and_other_fields() {
        let mut sse =
            sse_of(&[b": keep-alive\n\n", b"event: message\ndata: hi\n\n"]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_of(&[b"xxxxxx\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let mut sse = sse_of(&[b"data: unterminated\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_of(&[b"data: \xFF\xFE\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);
    }
}
