// src/parser.rs

/// Left-to-right cursor over a string, used by the substitution engine.
pub struct Scanner<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.i += c.len_utf8();
        Some(c)
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes the longest run of characters matching `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.i += c.len_utf8();
        }
        &self.s[start..self.i]
    }

    /// Consumes everything up to and including `end`, returning the text
    /// before it. Without a terminator the rest of the input is returned.
    pub fn capture_until(&mut self, end: char) -> &'a str {
        let captured = self.take_while(|c| c != end);
        self.consume_char(end);
        captured
    }

    /// Consumes a run of `c`, returning its length.
    pub fn count_run(&mut self, c: char) -> usize {
        self.take_while(|x| x == c).chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn capture_until_consumes_terminator() {
        let mut s = Scanner::new("name}rest");
        assert_eq!(s.capture_until('}'), "name");
        assert_eq!(s.peek_char(), Some('r'));
    }

    #[test]
    fn capture_until_runs_to_end_when_unterminated() {
        let mut s = Scanner::new("name");
        assert_eq!(s.capture_until('}'), "name");
        assert_eq!(s.peek_char(), None);
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut s = Scanner::new("é##x");
        assert_eq!(s.bump(), Some('é'));
        assert_eq!(s.count_run('#'), 2);
        assert_eq!(s.take_while(|c| c.is_ascii_alphanumeric()), "x");
        assert_eq!(s.peek_char(), None);
    }
}
