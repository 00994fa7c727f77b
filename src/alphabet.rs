use itertools::Itertools;

use crate::Show;

/// Represents an alphabet where a symbol is just a single `char`.
///
/// The symbols are kept in the order in which they were declared, so iterating over the
/// [`universe`](CharAlphabet::universe) reproduces the order of the alphabet field of the
/// encoding. An alphabet never contains a symbol twice, the parser rejects duplicate
/// declarations before this type is ever constructed.
#[derive(Clone, Default, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct CharAlphabet(pub(crate) Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] from the given symbols. The caller guarantees that
    /// the symbols are unique.
    pub fn new(symbols: Vec<char>) -> Self {
        debug_assert!(symbols.iter().all_unique());
        Self(symbols)
    }

    /// Creates a new [`CharAlphabet`] of the given size. The symbols are just the first
    /// `size` letters of the latin alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size < 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Returns an iterator over all symbols in the alphabet.
    pub fn universe(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().cloned()
    }

    /// Returns true if the given symbol is present in the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.0.contains(&symbol)
    }

    /// Returns the number of symbols in the alphabet.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the alphabet holds no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<char>> for CharAlphabet {
    fn from(value: Vec<char>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().collect())
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }

    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
    {
        format!(
            "\"{}\"",
            iter.into_iter().map(|sym| sym.to_string()).join("")
        )
    }
}

impl Show for CharAlphabet {
    fn show(&self) -> String {
        char::show_collection(self.0.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::CharAlphabet;
    use crate::Show;

    #[test]
    fn universe_preserves_declaration_order() {
        let alphabet: CharAlphabet = "bca".chars().collect();
        assert_eq!(alphabet.universe().collect::<Vec<_>>(), vec!['b', 'c', 'a']);
        assert_eq!(alphabet.size(), 3);
        assert!(alphabet.contains('c'));
        assert!(!alphabet.contains('d'));
    }

    #[test]
    fn of_size_and_show() {
        let alphabet = CharAlphabet::of_size(2);
        assert_eq!(alphabet[0], 'a');
        assert_eq!(alphabet[1], 'b');
        assert_eq!(alphabet.show(), "\"ab\"");
    }
}
