use criterion::{black_box, criterion_group, criterion_main, Criterion};
use podwise_rust::episode::{transcript_filename, Book};
use podwise_rust::extraction::{dedup_case_insensitive, parse_chunk_response, split_into_chunks};
use podwise_rust::transcript::{render_transcript, TranscriptSegment};

fn sample_transcript(segments: u64) -> String {
    let segments: Vec<TranscriptSegment> = (0..segments)
        .map(|i| {
            TranscriptSegment::new(
                i * 4,
                format!("segment {}: we talked about Atomic Habits by James Clear and the Oura Ring", i),
            )
        })
        .collect();
    render_transcript(&segments)
}

fn bench_chunking(c: &mut Criterion) {
    // roughly a one-hour episode
    let transcript = sample_transcript(900);

    c.bench_function("chunk_one_hour_transcript", |b| {
        b.iter(|| black_box(split_into_chunks(black_box(&transcript), 8000)))
    });

    c.bench_function("chunk_small_chunks", |b| {
        b.iter(|| black_box(split_into_chunks(black_box(&transcript), 500)))
    });
}

fn bench_response_parsing(c: &mut Criterion) {
    let mut response = String::from("BOOKS:\n");
    for i in 0..20 {
        response.push_str(&format!("- Book {} by Author {}\n", i, i));
    }
    response.push_str("\nPRODUCTS:\n");
    for i in 0..20 {
        response.push_str(&format!("{}. Product {} - does thing {}\n", i + 1, i, i));
    }
    response.push_str("\nSUMMARY:\nQ: What matters?\nA: Small habits, repeated.");

    c.bench_function("parse_chunk_response", |b| {
        b.iter(|| black_box(parse_chunk_response(black_box(&response))))
    });
}

fn bench_dedup(c: &mut Criterion) {
    let books: Vec<Book> = (0..2000)
        .map(|i| {
            if i % 2 == 0 {
                Book::new(format!("Title {}", i % 300), format!("Author {}", i % 300))
            } else {
                Book::new(format!("TITLE {}", i % 300), format!("author {}", i % 300))
            }
        })
        .collect();

    c.bench_function("dedup_2000_books", |b| {
        b.iter(|| black_box(dedup_case_insensitive(black_box(books.clone()))))
    });

    c.bench_function("transcript_filename", |b| {
        b.iter(|| black_box(transcript_filename(black_box("#412: Q&A with Dr. Smith — Sleep, Focus & More!"))))
    });
}

criterion_group!(benches, bench_chunking, bench_response_parsing, bench_dedup);
criterion_main!(benches);
