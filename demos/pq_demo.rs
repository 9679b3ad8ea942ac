//! Product Quantization: ADC vs. SDC
//!
//! Compress every vector to one byte per segment, then search by table
//! lookup instead of floating-point distance.
//!
//! ```text
//! Train:  sample -> k-means per segment -> codebooks (<= 256 centroids each)
//! Encode: vector -> nearest centroid per segment -> [i8; segments]
//! ADC:    exact query  vs. quantized points (query -> centroid table)
//! SDC:    quantized query vs. quantized points (centroid -> centroid table)
//! ```
//!
//! ```bash
//! cargo run --example pq_demo --release
//! ```

use std::collections::HashSet;
use std::time::Instant;
use vicinal::quantization::{DistanceMode, PQIndex, PQParams, ProductQuantizer};
use vicinal::{select_k, DistanceMetric, RandomSource};

fn main() -> vicinal::Result<()> {
    println!("Product Quantization");
    println!("====================\n");

    let dim = 64;
    let n = 10_000;
    let k = 10;

    let mut rng = RandomSource::seed_from_u64(42);
    let vectors: Vec<Vec<f32>> = (0..n)
        .map(|_| (0..dim).map(|_| rng.gaussian() as f32).collect())
        .collect();
    let queries: Vec<Vec<f32>> = vectors.iter().step_by(200).cloned().collect();

    let params = PQParams {
        segment_width: 4,
        codebook_size: 256,
        kmeans_iterations: 25,
        ..PQParams::default()
    };

    let start = Instant::now();
    let mut pq = ProductQuantizer::new(dim, params)?;
    pq.train(&vectors[..4_000], &mut rng)?;
    println!(
        "   Trained {} codebooks in {:.2?}",
        pq.num_segments(),
        start.elapsed()
    );
    println!(
        "   {} bytes/vector instead of {} ({}x smaller)\n",
        pq.num_segments(),
        dim * 4,
        dim * 4 / pq.num_segments()
    );

    for mode in [DistanceMode::Asymmetric, DistanceMode::Symmetric] {
        let mut index = PQIndex::new(pq.clone(), mode)?;
        index.add_batch(&vectors)?;

        let start = Instant::now();
        let results = index.search_knn_batch(&queries, k)?;
        let elapsed = start.elapsed();

        let mut recall = 0.0;
        for (q, hits) in queries.iter().zip(&results) {
            let truth = ground_truth(q, &vectors, k)?;
            let found: HashSet<u32> = hits.iter().map(|n| n.id).collect();
            recall += truth.iter().filter(|id| found.contains(id)).count() as f64 / k as f64;
        }

        println!(
            "   {:?}: recall@{} = {:.1}%, {:.2?}/query",
            mode,
            k,
            100.0 * recall / queries.len() as f64,
            elapsed / queries.len() as u32
        );
    }

    println!("\nDone!");
    Ok(())
}

fn ground_truth(query: &[f32], vectors: &[Vec<f32>], k: usize) -> vicinal::Result<Vec<u32>> {
    let ids: Vec<u32> = (0..vectors.len() as u32).collect();
    let distances: Vec<f32> = vectors
        .iter()
        .map(|v| DistanceMetric::SquaredL2.compute(query, v))
        .collect();
    Ok(select_k(&ids, &distances, k)?.into_iter().map(|n| n.id).collect())
}
