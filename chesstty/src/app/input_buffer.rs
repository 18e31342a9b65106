use cozy_chess::Square;

/// Buffer for collecting square input (e.g., "e2", "e4")
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Only files a-h and ranks 1-8 are accepted, at most two characters.
    pub fn push_char(&mut self, c: char) {
        if self.buffer.len() < 2 && matches!(c, 'a'..='h' | '1'..='8') {
            self.buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.buffer.len() == 2
    }

    /// Try to parse the buffer as a square (e.g., "e2" -> Square)
    pub fn try_parse_square(&self) -> Option<Square> {
        if !self.is_complete() {
            return None;
        }
        chess::parse_square(&self.buffer)
    }
}
