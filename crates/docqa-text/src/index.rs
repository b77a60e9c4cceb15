use std::fmt::Display;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use docqa_core::{Error, Result};

use crate::tantivy_utils::{build_schema, register_tokenizer, LexicalFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

fn index_err(e: impl Display) -> Error {
	Error::Index(e.to_string())
}

/// A lexical score for the chunk stored at `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalMatch {
	pub position: usize,
	pub score: f32,
}

/// In-memory BM25 index over an ordered corpus of chunk texts.
///
/// The index is immutable; callers rebuild it whenever the corpus changes so
/// document statistics always cover every chunk.
pub struct LexicalIndex {
	index: Index,
	reader: IndexReader,
	fields: LexicalFields,
	len: usize,
}

impl LexicalIndex {
	pub fn build<'a, I>(texts: I) -> Result<Self>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let (schema, fields) = build_schema();
		let index = Index::create_in_ram(schema);
		register_tokenizer(&index);
		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES).map_err(index_err)?;
		let mut len = 0usize;
		for (position, text) in texts.into_iter().enumerate() {
			writer
				.add_document(doc!(fields.position => position as u64, fields.text => text.to_string()))
				.map_err(index_err)?;
			len += 1;
		}
		writer.commit().map_err(index_err)?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(index_err)?;
		debug!(docs = len, "Built lexical index");
		Ok(Self { index, reader, fields, len })
	}

	pub fn empty() -> Result<Self> {
		Self::build(std::iter::empty())
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Splits `text` exactly as indexed text is split.
	pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
		let mut analyzer = self.index.tokenizer_for_field(self.fields.text).map_err(index_err)?;
		let mut stream = analyzer.token_stream(text);
		let mut terms = Vec::new();
		stream.process(&mut |token| terms.push(token.text.clone()));
		Ok(terms)
	}

	/// Scores every document against `query` and returns the best `k`.
	///
	/// Documents sharing no term with the query score zero and still fill the
	/// result in corpus order. Equal scores keep corpus order.
	pub fn search(&self, query: &str, k: usize) -> Result<Vec<LexicalMatch>> {
		if k == 0 || self.len == 0 {
			return Ok(Vec::new());
		}
		let mut scores = vec![0.0f32; self.len];
		let terms = self.tokenize(query)?;
		if !terms.is_empty() {
			let clauses: Vec<(Occur, Box<dyn Query>)> = terms
				.iter()
				.map(|t| {
					let q: Box<dyn Query> = Box::new(TermQuery::new(
						Term::from_field_text(self.fields.text, t),
						IndexRecordOption::WithFreqs,
					));
					(Occur::Should, q)
				})
				.collect();
			let query = BooleanQuery::new(clauses);
			let searcher = self.reader.searcher();
			let top_docs = searcher.search(&query, &TopDocs::with_limit(self.len)).map_err(index_err)?;
			for (score, addr) in top_docs {
				let doc: TantivyDocument = searcher.doc(addr).map_err(index_err)?;
				let position = doc
					.get_first(self.fields.position)
					.and_then(|v| v.as_u64())
					.ok_or_else(|| index_err("document without position"))?;
				if let Some(slot) = scores.get_mut(position as usize) {
					*slot = score;
				}
			}
		}
		let mut ranked: Vec<LexicalMatch> =
			scores.into_iter().enumerate().map(|(position, score)| LexicalMatch { position, score }).collect();
		ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.position.cmp(&b.position)));
		ranked.truncate(k);
		Ok(ranked)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn positions(hits: &[LexicalMatch]) -> Vec<usize> {
		hits.iter().map(|h| h.position).collect()
	}

	#[test]
	fn matching_document_ranks_first() {
		let idx = LexicalIndex::build(["alpha beta", "gamma delta", "beta beta gamma"]).unwrap();
		let hits = idx.search("beta", 3).unwrap();
		assert_eq!(hits.len(), 3);
		assert!(hits[0].score > 0.0);
		assert!([0, 2].contains(&hits[0].position));
		assert_eq!(hits[2].position, 1);
		assert_eq!(hits[2].score, 0.0);
	}

	#[test]
	fn case_sensitive_terms() {
		let idx = LexicalIndex::build(["Rust", "rust"]).unwrap();
		let hits = idx.search("rust", 1).unwrap();
		assert_eq!(positions(&hits), vec![1]);
	}

	#[test]
	fn no_overlap_returns_corpus_order_with_zero_scores() {
		let idx = LexicalIndex::build(["one", "two", "three"]).unwrap();
		let hits = idx.search("zebra", 2).unwrap();
		assert_eq!(positions(&hits), vec![0, 1]);
		assert!(hits.iter().all(|h| h.score == 0.0));
	}

	#[test]
	fn blank_query_and_empty_index() {
		let idx = LexicalIndex::build(["one", "two"]).unwrap();
		assert_eq!(positions(&idx.search("   ", 5).unwrap()), vec![0, 1]);
		let empty = LexicalIndex::empty().unwrap();
		assert!(empty.is_empty());
		assert!(empty.search("one", 5).unwrap().is_empty());
		assert!(idx.search("one", 0).unwrap().is_empty());
	}

	#[test]
	fn tokenize_splits_on_whitespace_only() {
		let idx = LexicalIndex::empty().unwrap();
		assert_eq!(idx.tokenize("What is X? it's\tfine").unwrap(), vec!["What", "is", "X?", "it's", "fine"]);
	}
}
