use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shallowchart::{ChartParser, Grammar, Sentence};

const GRAMMAR_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/grammars/english-chunk.gram");

fn parse(parser: &ChartParser, sentence: &Sentence) -> usize {
  (0..sentence.num_kbest())
    .filter(|&k| parser.parse(sentence, k).is_ok())
    .count()
}

fn criterion_benchmark(c: &mut Criterion) {
  let grammar = Grammar::read_from_file(GRAMMAR_PATH).unwrap();
  let parser = ChartParser::new(&grammar);

  let simple = Sentence::from_tagged("simple", "the/the/DT dog/dog/NN barks/bark/VBZ").unwrap();
  let long = Sentence::from_tagged(
    "long",
    "the/the/DT old/old/JJ man/man/NN with/with/IN a/a/DT black/black/JJ dog/dog/NN \
     has/have/VBZ been/be/VBN walking/walk/VBG slowly/slowly/RB in/in/IN the/the/DT \
     park/park/NN and/and/CC the/the/DT garden/garden/NN ././Fp",
  )
  .unwrap();
  let fragments = Sentence::from_tagged(
    "fragments",
    "yes/yes/UH ,/,/Fc of/of/IN course/course/NN ,/,/Fc cats/cat/NNS/cat/VBZ ././Fp",
  )
  .unwrap();

  c.bench_function("parse simple", |b| {
    b.iter(|| parse(black_box(&parser), black_box(&simple)))
  });

  c.bench_function("parse long", |b| {
    b.iter(|| parse(black_box(&parser), black_box(&long)))
  });

  c.bench_function("parse fragments with k-best", |b| {
    b.iter(|| parse(black_box(&parser), black_box(&fragments)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
