/*!
  Packed strings: UTF-8 bytes stored four to a word, lowest byte first regardless of the
  module's byte order, followed by a NUL terminator. The last word is padded with zero bytes.

  ```text
  "test"  ->  [ 't' 'e' 's' 't' ] [ 0 0 0 0 ]
  ""      ->  [ 0 0 0 0 ]
  ```
*/

use super::Word;

/// Number of words occupied by `s`, terminator included.
pub fn encoded_len(s: &str) -> usize {
  s.len() / 4 + 1
}

/**
  Writes `s` into the first `encoded_len(s)` words of `out` and returns that count.

  # Panics

  Panics if `out` is shorter than `encoded_len(s)`.
*/
pub fn encode(s: &str, out: &mut [Word]) -> usize {
  let bytes = s.as_bytes();
  let len = encoded_len(s);

  for (i, word) in out[..len].iter_mut().enumerate() {
    let mut quad = [0u8; 4];
    for (j, byte) in quad.iter_mut().enumerate() {
      if let Some(b) = bytes.get(i * 4 + j) {
        *byte = *b;
      }
    }
    *word = Word::from_le_bytes(quad);
  }
  len
}

/**
  Reads a packed string from the front of `words`. Returns the string's bytes, without the
  terminator and padding, and the number of words consumed. Returns `None` if no terminator is
  found.
*/
pub fn decode(words: &[Word]) -> Option<(Vec<u8>, usize)> {
  let mut bytes = Vec::with_capacity(words.len() * 4);

  for (i, word) in words.iter().enumerate() {
    for byte in word.to_le_bytes().iter() {
      if *byte == 0 {
        return Some((bytes, i + 1));
      }
      bytes.push(*byte);
    }
  }
  None
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lengths() {
    assert_eq!(encoded_len(""), 1);
    assert_eq!(encoded_len("abc"), 1);
    assert_eq!(encoded_len("test"), 2);
    assert_eq!(encoded_len("GLSL.std.450"), 4);
  }

  #[test]
  fn empty_string_is_one_zero_word() {
    let mut out = [0xFFFF_FFFF; 2];
    assert_eq!(encode("", &mut out), 1);
    assert_eq!(out, [0, 0xFFFF_FFFF]);
    assert_eq!(decode(&out[..1]), Some((vec![], 1)));
  }

  #[test]
  fn packs_low_byte_first() {
    let mut out = [0xFFFF_FFFF; 3];
    assert_eq!(encode("test", &mut out), 2);
    assert_eq!(out, [0x7473_6574, 0, 0xFFFF_FFFF]);

    assert_eq!(encode("main", &mut out), 2);
    assert_eq!(decode(&out), Some((b"main".to_vec(), 2)));
  }

  #[test]
  #[should_panic]
  fn encode_into_short_buffer_panics() {
    let mut out = [0; 1];
    encode("test", &mut out);
  }

  #[test]
  fn stops_at_first_terminator() {
    // "ab" followed by padding, then an unrelated word.
    let words = [0x0000_6261, 0x6968_6766];
    assert_eq!(decode(&words), Some((b"ab".to_vec(), 1)));
  }

  #[test]
  fn unterminated() {
    assert_eq!(decode(&[0x6463_6261]), None);
    assert_eq!(decode(&[]), None);
  }

  #[test]
  fn multibyte_utf8() {
    let s = "héllo";
    let mut out = vec![0; encoded_len(s)];
    encode(s, &mut out);
    let (bytes, used) = decode(&out).unwrap();
    assert_eq!(used, out.len());
    assert_eq!(String::from_utf8(bytes).unwrap(), s);
  }
}
