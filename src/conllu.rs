//! CoNLL-U output split into sentences, for the token table and the
//! dependency tree listing on the run page.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    pub id: String,
    pub form: String,
    pub lemma: String,
    pub upostag: String,
    pub xpostag: String,
    pub feats: String,
    pub head: String,
    pub deprel: String,
    pub deps: String,
    pub misc: String,
}

impl Token {
    /// Missing columns stay empty; `_` reads as empty.
    fn from_line(line: &str) -> Self {
        let mut cols = line.split('\t').map(|c| (if c == "_" { "" } else { c }).to_string());
        let mut next = || cols.next().unwrap_or_default();
        Token {
            id: next(),
            form: next(),
            lemma: next(),
            upostag: next(),
            xpostag: next(),
            feats: next(),
            head: next(),
            deprel: next(),
            deps: next(),
            misc: next(),
        }
    }
}

/// One row of the indented tree listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub depth: usize,
    pub form: String,
    pub deprel: String,
    pub upostag: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Text of the sentence, tokens joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.form.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Depth-first walk from the artificial root, children in token order.
    /// Tokens whose head is missing or does not resolve are not listed.
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::with_capacity(self.tokens.len());
        let mut stack: Vec<(&str, usize)> = self
            .children_of("0")
            .rev()
            .map(|t| (t.id.as_str(), 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(token) = self.tokens.iter().find(|t| t.id == id) else {
                continue;
            };
            rows.push(TreeRow {
                depth,
                form: token.form.clone(),
                deprel: token.deprel.clone(),
                upostag: token.upostag.clone(),
            });
            // duplicate ids in malformed input could otherwise loop
            if depth < self.tokens.len() {
                stack.extend(self.children_of(id).rev().map(|t| (t.id.as_str(), depth + 1)));
            }
        }
        rows
    }

    fn children_of<'a>(&'a self, id: &'a str) -> impl DoubleEndedIterator<Item = &'a Token> {
        self.tokens.iter().filter(move |t| t.head == id)
    }
}

/// Split CoNLL-U text into sentences. Comment lines and multi-word token
/// ranges are skipped.
pub fn parse(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = Sentence::default();

    for line in text.lines() {
        if line.starts_with('#') || is_range_line(line) {
            continue;
        }
        if line.trim().is_empty() {
            if !current.tokens.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.tokens.push(Token::from_line(line));
    }
    if !current.tokens.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// `3-4\t...` lines describe multi-word tokens.
fn is_range_line(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && line.as_bytes().get(digits) == Some(&b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# newdoc
# sent_id = 1
1\tDěti\tdítě\tNOUN\t_\tCase=Nom\t2\tnsubj\t_\t_
2\tpojedou\tjet\tVERB\t_\t_\t0\troot\t_\t_
3\tk\tk\tADP\t_\t_\t4\tcase\t_\t_
4\tbabičce\tbabička\tNOUN\t_\t_\t2\tobl\t_\tSpaceAfter=No
5\t.\t.\tPUNCT\t_\t_\t2\tpunct\t_\t_

# sent_id = 2
1-2\tAby\t_\t_\t_\t_\t_\t_\t_\t_
1\tAby\taby\tSCONJ\t_\t_\t0\troot\t_\t_
2\tbys\tbýt\tAUX\t_\t_\t1\taux\t_\t_
";

    #[test]
    fn splits_sentences_and_skips_comments_and_ranges() {
        let sentences = parse(SAMPLE);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens.len(), 5);
        assert_eq!(sentences[1].tokens.len(), 2);
        assert_eq!(sentences[1].text(), "Aby bys");
    }

    #[test]
    fn underscore_columns_are_empty() {
        let sentences = parse(SAMPLE);
        let token = &sentences[0].tokens[0];
        assert_eq!(token.form, "Děti");
        assert_eq!(token.xpostag, "");
        assert_eq!(token.feats, "Case=Nom");
        assert_eq!(sentences[0].tokens[3].misc, "SpaceAfter=No");
    }

    #[test]
    fn tree_rows_follow_heads_depth_first() {
        let sentences = parse(SAMPLE);
        let tree = sentences[0].tree_rows();
        let rows: Vec<(usize, &str)> = tree.iter().map(|r| (r.depth, r.form.as_str())).collect();
        assert_eq!(
            rows,
            vec![(0, "pojedou"), (1, "Děti"), (1, "babičce"), (2, "k"), (1, ".")]
        );
    }

    #[test]
    fn short_lines_fill_missing_columns() {
        let sentences = parse("1\tHello\n");
        assert_eq!(sentences[0].tokens[0].form, "Hello");
        assert_eq!(sentences[0].tokens[0].head, "");
        assert!(sentences[0].tree_rows().is_empty());
    }

    #[test]
    fn head_cycle_terminates() {
        let sentences = parse("1\ta\t_\t_\t_\t_\t0\troot\t_\t_\n2\tb\t_\t_\t_\t_\t3\tdep\t_\t_\n3\tc\t_\t_\t_\t_\t2\tdep\t_\t_\n");
        let rows = sentences[0].tree_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].form, "a");
    }
}
