//! LSH: Locality-Sensitive Hashing
//!
//! Hash every vector into T tables; a query only looks at the buckets it
//! lands in, then ranks that small candidate set exactly.
//!
//! ```text
//! Index time:
//!   vector -> n hash functions per table -> composite code -> bucket
//!
//! Query time:
//!   query -> its bucket in each of T tables -> union -> exact distance
//! ```
//!
//! # Trade-offs
//!
//! | Parameter           | Higher Value                   | Lower Value          |
//! |---------------------|--------------------------------|----------------------|
//! | num_tables          | Better recall, more memory     | Faster build         |
//! | functions_per_table | Fewer candidates, faster query | Better recall        |
//! | bucket_width        | Better recall                  | Fewer candidates     |
//!
//! ```bash
//! cargo run --example lsh_demo --release
//! ```

use std::collections::HashSet;
use std::time::Instant;
use vicinal::hash::HashFamily;
use vicinal::lsh::{LSHIndex, LSHParams};
use vicinal::{select_k, DistanceMetric, RandomSource};

fn main() -> vicinal::Result<()> {
    println!("LSH: Hash-Based Vector Search");
    println!("=============================\n");

    let dim = 32;
    let n = 5_000;
    let k = 10;

    let mut rng = RandomSource::seed_from_u64(42);
    let vectors = clustered(n, dim, &mut rng);
    let queries = clustered(50, dim, &mut rng);

    println!("   {} vectors, dim={}, {} queries, k={}\n", n, dim, queries.len(), k);
    println!(
        "   {:>6} {:>9} {:>12} {:>10} {:>10}",
        "tables", "functions", "candidates", "recall", "query"
    );

    for (num_tables, functions_per_table) in [(2, 4), (8, 4), (16, 4), (16, 8), (32, 8)] {
        let params = LSHParams {
            num_tables,
            functions_per_table,
            family: HashFamily::Gaussian { bucket_width: 4.0 },
            ..LSHParams::default()
        };
        let mut index = LSHIndex::new(dim, params, &mut RandomSource::seed_from_u64(7))?;
        index.add_batch(&vectors)?;

        let start = Instant::now();
        let results = index.search_knn_batch(&queries, k)?;
        let elapsed = start.elapsed();

        let mut candidates = 0;
        let mut recall = 0.0;
        for (q, hits) in queries.iter().zip(&results) {
            candidates += index.candidates(q)?.len();
            let truth = ground_truth(q, &vectors, k)?;
            let found: HashSet<u32> = hits.iter().map(|n| n.id).collect();
            recall += truth.iter().filter(|id| found.contains(id)).count() as f64 / k as f64;
        }

        println!(
            "   {:>6} {:>9} {:>12.1} {:>9.1}% {:>8.2?}",
            num_tables,
            functions_per_table,
            candidates as f64 / queries.len() as f64,
            100.0 * recall / queries.len() as f64,
            elapsed / queries.len() as u32,
        );
    }

    println!("\nDone!");
    Ok(())
}

/// Points scattered around 20 random centres.
fn clustered(n: usize, dim: usize, rng: &mut RandomSource) -> Vec<Vec<f32>> {
    let mut centre_rng = RandomSource::seed_from_u64(1);
    let centres: Vec<Vec<f32>> = (0..20)
        .map(|_| (0..dim).map(|_| centre_rng.gaussian() as f32 * 10.0).collect())
        .collect();
    (0..n)
        .map(|_| {
            let c = &centres[rng.below(centres.len())];
            c.iter().map(|x| x + rng.gaussian() as f32).collect()
        })
        .collect()
}

fn ground_truth(query: &[f32], vectors: &[Vec<f32>], k: usize) -> vicinal::Result<Vec<u32>> {
    let ids: Vec<u32> = (0..vectors.len() as u32).collect();
    let distances: Vec<f32> = vectors
        .iter()
        .map(|v| DistanceMetric::L2.compute(query, v))
        .collect();
    Ok(select_k(&ids, &distances, k)?.into_iter().map(|n| n.id).collect())
}
