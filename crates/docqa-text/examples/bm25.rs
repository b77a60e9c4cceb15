use std::env;
use std::path::PathBuf;

// Rank the paragraphs of a text file against a query.
// Usage:
//   cargo run -p docqa-text --example bm25 -- <file> "your query" [--limit 5]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run -p docqa-text --example bm25 -- <file> <query> [--limit N]");
        std::process::exit(1);
    }
    let path = PathBuf::from(&args[0]);
    let query = &args[1];
    let limit = match args.get(2).map(String::as_str) {
        Some("--limit") => args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5),
        _ => 5,
    };

    let content = std::fs::read_to_string(&path)?;
    let paragraphs: Vec<&str> = content.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
    let index = docqa_text::LexicalIndex::build(paragraphs.iter().copied())?;

    println!("BM25 over {} paragraphs of {}", index.len(), path.display());
    for (i, hit) in index.search(query, limit)?.iter().enumerate() {
        let preview: String = paragraphs[hit.position].chars().take(80).collect();
        println!("{:>2}. score={:.3} #{} {}", i + 1, hit.score, hit.position, preview.replace('\n', " "));
    }
    Ok(())
}
