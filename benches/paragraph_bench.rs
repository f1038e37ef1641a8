use antecede::{rewrite_paragraph, Cluster, Mention};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Build a paragraph where sentence 0 introduces the entity and every later
/// sentence carries one pronoun mention of it.
fn synthetic_paragraph(sentence_count: usize) -> (Vec<String>, Vec<Cluster>) {
    let first = "Eleanor Rigby kept the house tidy.".to_string();
    let mut offset = first.chars().count();
    let mut sentences = vec![first];
    let mut mentions = vec![Mention {
        text: "Eleanor Rigby".to_string(),
        start: 0,
        end: 13,
        sentence_index: 0,
    }];

    for sentence_index in 1..sentence_count {
        let sentence = " Later she cleaned the windows again.".to_string();
        // "she" sits at local offset 7..10 of every generated sentence.
        mentions.push(Mention {
            text: "she".to_string(),
            start: offset + 7,
            end: offset + 10,
            sentence_index,
        });
        offset += sentence.chars().count();
        sentences.push(sentence);
    }

    let main = mentions[0].clone();
    (sentences, vec![Cluster { main, mentions }])
}

fn bench_rewrite_paragraph(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite_paragraph");

    for &sentence_count in &[8usize, 32, 128] {
        let (sentences, clusters) = synthetic_paragraph(sentence_count);
        let chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
        group.throughput(Throughput::Elements(chars as u64));
        group.bench_function(format!("{sentence_count}_sentences"), |b| {
            b.iter(|| {
                let output =
                    rewrite_paragraph(black_box(&sentences), black_box(&clusters), black_box(""));
                black_box(output)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rewrite_paragraph);
criterion_main!(benches);
