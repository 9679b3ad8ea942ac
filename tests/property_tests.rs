//! Property-based tests for vicinal components.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Distance metrics are non-negative, symmetric and zero on identical inputs
//! - Top-k selection agrees with a full sort
//! - LSH refinement reports exact distances
//! - Quantizer centroids quantize to themselves

use proptest::prelude::*;

prop_compose! {
    fn arb_vector(dim: usize)(vec in prop::collection::vec(-10.0f32..10.0, dim)) -> Vec<f32> {
        vec
    }
}

prop_compose! {
    fn arb_database(n: usize, dim: usize)(
        vecs in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, dim), 1..n)
    ) -> Vec<Vec<f32>> {
        vecs
    }
}

mod distance_props {
    use super::*;
    use vicinal::DistanceMetric;

    const METRICS: [DistanceMetric; 4] = [
        DistanceMetric::SquaredL2,
        DistanceMetric::L2,
        DistanceMetric::L1,
        DistanceMetric::Cosine,
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn distance_non_negative(a in arb_vector(32), b in arb_vector(32)) {
            for metric in METRICS {
                prop_assert!(metric.compute(&a, &b) >= -1e-6);
            }
        }

        #[test]
        fn distance_symmetric(a in arb_vector(32), b in arb_vector(32)) {
            for metric in METRICS {
                let ab = metric.compute(&a, &b);
                let ba = metric.compute(&b, &a);
                prop_assert!((ab - ba).abs() <= 1e-5 * ab.abs().max(1.0));
            }
        }

        #[test]
        fn distance_self_is_zero(a in arb_vector(32)) {
            prop_assert_eq!(DistanceMetric::SquaredL2.compute(&a, &a), 0.0);
            prop_assert_eq!(DistanceMetric::L2.compute(&a, &a), 0.0);
            prop_assert_eq!(DistanceMetric::L1.compute(&a, &a), 0.0);
        }

        #[test]
        fn l2_triangle_inequality(
            a in arb_vector(16),
            b in arb_vector(16),
            c in arb_vector(16),
        ) {
            let l2 = DistanceMetric::L2;
            let ab = l2.compute(&a, &b);
            let bc = l2.compute(&b, &c);
            let ac = l2.compute(&a, &c);
            prop_assert!(ac <= ab + bc + 1e-3);
        }
    }
}

mod select_props {
    use super::*;
    use vicinal::{select_k, PointId};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn select_k_matches_full_sort(
            distances in prop::collection::vec(0u8..20, 0..200),
            k in 0usize..250,
        ) {
            // Small integer distances force plenty of ties.
            let distances: Vec<f32> = distances.into_iter().map(f32::from).collect();
            let ids: Vec<PointId> = (0..distances.len() as PointId).rev().collect();

            let got = select_k(&ids, &distances, k).unwrap();

            let mut expected: Vec<(f32, PointId)> =
                distances.iter().copied().zip(ids.iter().copied()).collect();
            expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            expected.truncate(k);

            prop_assert_eq!(got.len(), k.min(distances.len()));
            for (n, (d, id)) in got.iter().zip(&expected) {
                prop_assert_eq!(n.distance, *d);
                prop_assert_eq!(n.id, *id);
            }
        }
    }
}

#[cfg(feature = "lsh")]
mod lsh_props {
    use super::*;
    use vicinal::lsh::{LSHIndex, LSHParams};
    use vicinal::RandomSource;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn refinement_is_exact(
            database in arb_database(60, 6),
            query in arb_vector(6),
            seed in any::<u64>(),
            k in 1usize..10,
        ) {
            let mut rng = RandomSource::seed_from_u64(seed);
            let params = LSHParams { num_tables: 4, functions_per_table: 2, ..LSHParams::default() };
            let mut index = LSHIndex::new(6, params, &mut rng).unwrap();
            index.add_batch(&database).unwrap();

            let candidates = index.candidates(&query).unwrap();
            prop_assert!(candidates.windows(2).all(|w| w[0] < w[1]));

            let hits = index.search_knn(&query, k).unwrap();
            prop_assert_eq!(hits.len(), k.min(candidates.len()));
            prop_assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
            for hit in &hits {
                prop_assert!(candidates.binary_search(&hit.id).is_ok());
                let stored = index.get(hit.id).unwrap();
                prop_assert_eq!(hit.distance, params.metric.compute(&query, stored));
            }
        }
    }
}

#[cfg(feature = "pq")]
mod pq_props {
    use super::*;
    use vicinal::quantization::{PQParams, ProductQuantizer};
    use vicinal::RandomSource;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn centroids_quantize_to_themselves(
            database in arb_database(80, 4),
            seed in any::<u64>(),
        ) {
            let params = PQParams { segment_width: 2, codebook_size: 8, ..PQParams::default() };
            let mut pq = ProductQuantizer::new(4, params).unwrap();
            pq.train(&database, &mut RandomSource::seed_from_u64(seed)).unwrap();

            for (segment, codebook) in pq.codebooks().iter().enumerate() {
                prop_assert!(codebook.len() <= 8);
                for (j, centroid) in codebook.iter().enumerate() {
                    let mut v = vec![0.0f32; 4];
                    v[segment * 2..segment * 2 + 2].copy_from_slice(centroid);
                    let got = pq.quantize(&v).unwrap().centroid_index(segment);
                    // Identical centroids resolve to the lowest index.
                    prop_assert_eq!(codebook.centroid(got), centroid);
                    prop_assert!(got <= j);
                }
            }
        }

        #[test]
        fn codes_have_one_byte_per_segment(
            database in arb_database(40, 6),
            query in arb_vector(6),
        ) {
            let params = PQParams { segment_width: 3, codebook_size: 4, ..PQParams::default() };
            let mut pq = ProductQuantizer::new(6, params).unwrap();
            pq.train(&database, &mut RandomSource::seed_from_u64(0)).unwrap();
            let code = pq.quantize(&query).unwrap();
            prop_assert_eq!(code.len(), 2);
            prop_assert_eq!(pq.decode(&code).unwrap().len(), 6);
        }
    }
}
