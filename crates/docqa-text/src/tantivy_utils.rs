//! Schema and analyzer shared by the lexical index.
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::Index;

pub const WHITESPACE: &str = "whitespace_exact";
pub const POSITION_FIELD: &str = "position";
pub const TEXT_FIELD: &str = "text";

pub struct LexicalFields {
	pub position: Field,
	pub text: Field,
}

pub fn build_schema() -> (Schema, LexicalFields) {
	let mut schema_builder = Schema::builder();
	let position = schema_builder.add_u64_field(POSITION_FIELD, STORED);
	// Term frequencies feed BM25; positions are never queried.
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(WHITESPACE).set_index_option(IndexRecordOption::WithFreqs);
	let text = schema_builder.add_text_field(TEXT_FIELD, TextOptions::default().set_indexing_options(text_field_indexing));
	(schema_builder.build(), LexicalFields { position, text })
}

/// Whitespace split with no case folding or stop words.
pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
	index.tokenizers().register(WHITESPACE, tokenizer);
}
