//! Integration tests for product quantization and the ADC/SDC indices.
#![cfg(feature = "pq")]

use vicinal::quantization::{
    ADCIndex, DistanceMode, PQIndex, PQParams, ProductQuantizer, QuantizedCode, SDCIndex,
};
use vicinal::{DistanceMetric, RandomSource, RetrieveError};

fn random_corpus(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = RandomSource::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gaussian() as f32).collect())
        .collect()
}

fn pq_params(segment_width: usize, codebook_size: usize) -> PQParams {
    PQParams {
        segment_width,
        codebook_size,
        ..PQParams::default()
    }
}

fn trained(dim: usize, params: PQParams, samples: &[Vec<f32>], seed: u64) -> ProductQuantizer {
    let mut pq = ProductQuantizer::new(dim, params).unwrap();
    pq.train(samples, &mut RandomSource::seed_from_u64(seed)).unwrap();
    pq
}

/// Concatenation of one centroid per segment.
fn centroid_vector(pq: &ProductQuantizer, indices: &[usize]) -> Vec<f32> {
    pq.decode(&QuantizedCode::from_indices(indices).unwrap()).unwrap()
}

#[test]
fn adc_and_sdc_agree_when_quantization_is_lossless() {
    for metric in [DistanceMetric::SquaredL2, DistanceMetric::L1] {
        let params = PQParams {
            metric,
            ..pq_params(2, 8)
        };
        let pq = trained(6, params, &random_corpus(300, 6, 1), 2);
        let mut rng = RandomSource::seed_from_u64(3);
        let mut pick = |pq: &ProductQuantizer| -> Vec<f32> {
            let indices: Vec<usize> = pq.codebooks().iter().map(|c| rng.below(c.len())).collect();
            centroid_vector(pq, &indices)
        };

        let stored: Vec<Vec<f32>> = (0..40).map(|_| pick(&pq)).collect();
        let query = pick(&pq);

        let mut adc = ADCIndex::new(pq.clone()).unwrap();
        let mut sdc = SDCIndex::new(pq.clone()).unwrap();
        adc.add_batch(&stored).unwrap();
        sdc.add_batch(&stored).unwrap();

        let adc_d = adc.compute_distances(&query).unwrap();
        let sdc_d = sdc.compute_distances(&query).unwrap();
        for ((a, s), v) in adc_d.iter().zip(&sdc_d).zip(&stored) {
            let exact = metric.compute(&query, v);
            assert_eq!(a, s);
            assert!((a - exact).abs() <= 1e-4 * exact.max(1.0), "{a} vs {exact}");
        }
    }
}

#[test]
fn every_centroid_quantizes_to_itself() {
    let pq = trained(8, pq_params(4, 16), &random_corpus(500, 8, 4), 5);
    for (segment, codebook) in pq.codebooks().iter().enumerate() {
        for j in 0..codebook.len() {
            let mut indices = vec![0; pq.num_segments()];
            indices[segment] = j;
            let code = pq.quantize(&centroid_vector(&pq, &indices)).unwrap();
            assert_eq!(code.centroid_index(segment), j);
        }
    }
}

#[test]
fn two_pair_scenario_codes_are_stable() {
    let samples: Vec<Vec<f32>> = vec![
        vec![0.0, 0.0, 20.0, 20.0],
        vec![0.5, 0.0, 20.5, 20.0],
        vec![10.0, 10.0, -20.0, -20.0],
        vec![10.5, 10.0, -20.5, -20.0],
    ];
    let pq = trained(4, pq_params(2, 2), &samples, 6);
    assert_eq!(pq.num_segments(), 2);

    let codes: Vec<QuantizedCode> = samples.iter().map(|v| pq.quantize(v).unwrap()).collect();
    for (v, code) in samples.iter().zip(&codes) {
        assert_eq!(&pq.quantize(v).unwrap(), code);
    }
    assert_eq!(codes[0], codes[1]);
    assert_eq!(codes[2], codes[3]);
    assert_ne!(codes[0], codes[2]);

    let mut adc = ADCIndex::new(pq.clone()).unwrap();
    let mut sdc = SDCIndex::new(pq.clone()).unwrap();
    for v in &samples {
        adc.add(v).unwrap();
        sdc.add(v).unwrap();
    }
    for (id, code) in codes.iter().enumerate() {
        assert_eq!(adc.code(id as u32).as_ref(), Some(code));
        assert_eq!(sdc.code(id as u32).as_ref(), Some(code));
    }
}

#[test]
fn knn_with_k_beyond_corpus_returns_everything_sorted() {
    let corpus = random_corpus(30, 4, 7);
    for mode in [DistanceMode::Asymmetric, DistanceMode::Symmetric] {
        let mut rng = RandomSource::seed_from_u64(8);
        let mut index = PQIndex::train(4, pq_params(2, 4), mode, &corpus, &mut rng).unwrap();
        index.add_batch(&corpus).unwrap();

        let hits = index.search_knn(&corpus[0], 100).unwrap();
        assert_eq!(hits.len(), 30);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let mut ids: Vec<u32> = hits.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..30).collect::<Vec<u32>>());
    }
}

#[test]
fn nearest_neighbour_is_the_best_ranked_result() {
    let corpus = random_corpus(200, 8, 9);
    let queries = random_corpus(10, 8, 10);
    let pq = trained(8, pq_params(2, 16), &corpus, 11);
    let mut index = ADCIndex::new(pq).unwrap();
    index.add_batch(&corpus).unwrap();

    for q in &queries {
        let nn = index.search_nn(q).unwrap().unwrap();
        assert_eq!(nn, index.search_knn(q, 1).unwrap()[0]);
    }
}

#[test]
fn batch_queries_match_sequential_queries() {
    let corpus = random_corpus(150, 6, 12);
    let queries = random_corpus(12, 6, 13);
    let pq = trained(6, pq_params(3, 8), &corpus, 14);
    let mut index = SDCIndex::new(pq).unwrap();
    index.add_batch(&corpus).unwrap();

    let batched = index.search_knn_batch(&queries, 5).unwrap();
    for (q, got) in queries.iter().zip(batched) {
        assert_eq!(got, index.search_knn(q, 5).unwrap());
    }
}

#[test]
fn adc_tracks_true_distances_on_clustered_data() {
    // Well separated clusters: the exact nearest cluster must win under ADC.
    let centers = [[0.0f32, 0.0, 0.0, 0.0], [50.0, 50.0, 50.0, 50.0]];
    let mut rng = RandomSource::seed_from_u64(15);
    let corpus: Vec<Vec<f32>> = (0..100)
        .map(|i| {
            let c = centers[i % 2];
            c.iter().map(|x| x + rng.gaussian() as f32 * 0.1).collect()
        })
        .collect();
    let pq = trained(4, pq_params(2, 4), &corpus, 16);
    let mut index = ADCIndex::new(pq).unwrap();
    index.add_batch(&corpus).unwrap();

    let hits = index.search_knn(&[49.0, 49.0, 49.0, 49.0], 10).unwrap();
    assert!(hits.iter().all(|n| n.id % 2 == 1));
}

#[test]
fn configuration_errors_are_reported() {
    let dims = |segment_width, codebook_size| {
        ProductQuantizer::new(10, pq_params(segment_width, codebook_size))
    };
    assert!(matches!(dims(3, 8), Err(RetrieveError::InvalidConfiguration(_))));
    assert!(matches!(dims(0, 8), Err(RetrieveError::InvalidConfiguration(_))));
    assert!(matches!(dims(5, 0), Err(RetrieveError::InvalidConfiguration(_))));
    assert!(matches!(dims(5, 300), Err(RetrieveError::InvalidConfiguration(_))));
    assert!(dims(5, 256).is_ok());

    let untrained = ProductQuantizer::new(4, pq_params(2, 4)).unwrap();
    assert_eq!(untrained.quantize(&[0.0; 4]).unwrap_err(), RetrieveError::NotTrained);
    assert_eq!(
        PQIndex::new(untrained, DistanceMode::Symmetric).unwrap_err(),
        RetrieveError::NotTrained
    );

    let pq = trained(4, pq_params(2, 4), &random_corpus(20, 4, 17), 18);
    let mut index = ADCIndex::new(pq).unwrap();
    assert_eq!(
        index.add(&[1.0, 2.0]).unwrap_err(),
        RetrieveError::InvalidDimension {
            expected: 4,
            actual: 2
        }
    );
    assert!(index.search_knn(&[1.0; 5], 1).is_err());
}

#[test]
fn params_deserialize_with_defaults() {
    let params: PQParams =
        serde_json::from_str(r#"{"segment_width": 4, "metric": "l1"}"#).unwrap();
    assert_eq!(params.segment_width, 4);
    assert_eq!(params.codebook_size, 256);
    assert_eq!(params.metric, DistanceMetric::L1);
    assert!(params.validate().is_ok());
}
