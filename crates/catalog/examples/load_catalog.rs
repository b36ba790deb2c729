use catalog::CatalogIndex;
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/catalog.sample.json");

    println!("Loading genre catalog...\n");

    let start = Instant::now();
    let index = CatalogIndex::load_from_file(path)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let (genres, ranked, embedded, artists) = index.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Genres: {}", genres);
    println!("With rank lists: {}", ranked);
    println!("With embeddings: {} (dimension {:?})", embedded, index.embedding_dimension());
    println!("Artists: {}", artists);
}
