use clausetab::{AnnotationDocument, ParserConfig, TableParser, WordOrderQuery};
use divan::{Bencher, black_box};

fn main() {
    divan::main();
}

const RELATIONS: [&str; 6] = ["SBJ", "OBJ", "VERB", "say", "ADV", ""];
const AGREEMENT: [&str; 4] = ["zero", "3sg", "", "1pl"];

/// Synthetic table in the reference layout: eight-row blocks, one clause
/// starting every four columns
fn synthetic_table(blocks: usize, columns: usize) -> String {
    let mut text = String::new();
    let mut clause = 0;
    for _ in 0..blocks {
        let mut ids = Vec::with_capacity(columns);
        let mut types = Vec::with_capacity(columns);
        let mut relations = Vec::with_capacity(columns);
        let mut agreement = Vec::with_capacity(columns);
        for j in 0..columns {
            if j % 4 == 0 {
                ids.push(format!("c{}", clause));
                let kind = if clause % 2 == 0 { "decl" } else { "quest" };
                types.push(kind.to_string());
                clause += 1;
            } else {
                ids.push(String::new());
                types.push(String::new());
            }
            relations.push(RELATIONS[j % RELATIONS.len()].to_string());
            agreement.push(AGREEMENT[j % AGREEMENT.len()].to_string());
        }
        let blank = vec![""; columns].join("\t");
        for row in [
            blank.clone(),
            blank.clone(),
            ids.join("\t"),
            types.join("\t"),
            relations.join("\t"),
            agreement.join("\t"),
            blank.clone(),
            blank,
        ] {
            text.push_str(&row);
            text.push('\n');
        }
    }
    text
}

#[divan::bench(args = [10, 100, 1000])]
fn parse_table(bencher: Bencher, blocks: usize) {
    let text = synthetic_table(blocks, 40);
    let config = ParserConfig::default();
    bencher.bench_local(|| {
        black_box(TableParser::from_string(black_box(&text), &config).unwrap());
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn convert_to_graph(bencher: Bencher, blocks: usize) {
    let text = synthetic_table(blocks, 40);
    let config = ParserConfig::default();
    bencher.bench_local(|| {
        black_box(AnnotationDocument::from_string(black_box(&text), &config).unwrap());
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn word_orders(bencher: Bencher, blocks: usize) {
    let text = synthetic_table(blocks, 40);
    let parser = TableParser::from_string(&text, &ParserConfig::default()).unwrap();
    let query = WordOrderQuery::new()
        .with_terms(["SBJ", "OBJ", "VERB"])
        .with_agreement(true);
    bencher.bench_local(|| {
        let count = query.run(parser.document()).filter(Result::is_ok).count();
        black_box(count);
    });
}
