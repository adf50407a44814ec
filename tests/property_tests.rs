//! Property-based tests for pmbga
//!
//! Uses proptest to verify invariants of the learned models and operators.

use pmbga::prelude::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Parent sets of 1..24 rows over 1..8 loci
fn parent_sets() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1usize..8, 1usize..24).prop_flat_map(|(len, n)| {
        prop::collection::vec(prop::collection::vec(any::<bool>(), len), n)
    })
}

fn network(rows: Vec<Vec<bool>>, config: &NetworkConfig) -> (GeneMatrix, BayesianNetwork) {
    let genes = GeneMatrix::new(rows).unwrap();
    let table = LogGammaTable::new(genes.len());
    let net = BayesianNetwork::build(&genes, config, &table).unwrap();
    (genes, net)
}

proptest! {
    // ==================== Scoring Properties ====================

    #[test]
    fn leaf_score_symmetric_and_non_positive(n in 0usize..200, frac in 0.0f64..=1.0) {
        let table = LogGammaTable::new(200);
        let n1 = ((n as f64) * frac) as usize;
        let score = table.leaf_score(n, n1);
        prop_assert!(score <= 1e-12);
        prop_assert!((score - table.leaf_score(n, n - n1)).abs() < 1e-9);
    }

    // ==================== Linkage Model Properties ====================

    #[test]
    fn linkage_partitions_cover_every_locus_once(rows in parent_sets()) {
        let genes = GeneMatrix::new(rows).unwrap();
        let model = LinkageModel::build(&genes).unwrap();

        let mut seen = vec![0usize; genes.genome_length()];
        for partition in model.partitions() {
            prop_assert!(!partition.is_empty());
            for &var in partition.members() {
                seen[var] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn linkage_merges_always_help(rows in parent_sets()) {
        let genes = GeneMatrix::new(rows).unwrap();
        let model = LinkageModel::build(&genes).unwrap();
        let length = genes.genome_length();

        prop_assert!(model.merges().iter().all(|m| m.gain > 0.0));
        prop_assert!(model.merges().len() <= length.saturating_sub(1));
        prop_assert!(model.description_length() <= model.initial_description_length());
        prop_assert_eq!(model.group_count() + model.merges().len(), length);
    }

    #[test]
    fn linkage_tables_are_distributions(rows in parent_sets()) {
        let genes = GeneMatrix::new(rows).unwrap();
        let model = LinkageModel::build(&genes).unwrap();
        for partition in model.partitions() {
            let table = model.table(partition).unwrap();
            let total: f64 = table.entries().iter().map(|(_, p)| p).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            prop_assert!(table.entries().iter().all(|(pattern, _)| pattern.len() == partition.len()));
        }
    }

    #[test]
    fn linkage_samples_have_genome_length(rows in parent_sets(), seed in any::<u64>()) {
        let genes = GeneMatrix::new(rows).unwrap();
        let model = LinkageModel::build(&genes).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let child = model.sample_bits(&mut rng);
        prop_assert_eq!(child.len(), genes.genome_length());
    }

    #[test]
    fn linkage_is_deterministic(rows in parent_sets()) {
        let genes = GeneMatrix::new(rows).unwrap();
        let a = LinkageModel::build(&genes).unwrap();
        let b = LinkageModel::build(&genes).unwrap();
        prop_assert_eq!(a.to_string(), b.to_string());
        prop_assert_eq!(a.merges(), b.merges());
    }

    #[test]
    fn linkage_sampling_leaves_tables_untouched(rows in parent_sets(), seed in any::<u64>()) {
        let genes = GeneMatrix::new(rows).unwrap();
        let model = LinkageModel::build(&genes).unwrap();
        let tables = |m: &LinkageModel| -> Vec<JointTable> {
            m.partitions().map(|p| m.table(p).unwrap().clone()).collect()
        };
        let before = tables(&model);

        let mut first = StdRng::seed_from_u64(seed);
        let mut second = first.clone();
        let a: Vec<Vec<bool>> = (0..8).map(|_| model.sample_bits(&mut first)).collect();
        let b: Vec<Vec<bool>> = (0..8).map(|_| model.sample_bits(&mut second)).collect();

        prop_assert_eq!(a, b);
        prop_assert_eq!(tables(&model), before);
    }

    // ==================== Bayesian Network Properties ====================

    #[test]
    fn network_stays_acyclic_under_parent_cap(rows in parent_sets(), cap in 0usize..4) {
        let config = NetworkConfig::default().with_max_parents(cap);
        let (genes, net) = network(rows, &config);
        let length = genes.genome_length();

        prop_assert!(net.graph().topological_order().is_some());
        prop_assert!((0..length).all(|v| !net.graph().ancestors(v).contains(v)));
        if cap > 0 {
            prop_assert!(net.graph().max_in_degree() <= cap);
        }
        prop_assert!(net.splits().len() <= length * length.saturating_sub(1) / 2);
        prop_assert_eq!(net.graph().edge_count(), net.splits().len());
    }

    #[test]
    fn network_splits_always_help(rows in parent_sets(), penalty in 0.0f64..3.0) {
        let config = NetworkConfig::default().with_split_penalty(penalty);
        let (_, net) = network(rows, &config);

        prop_assert!(net.splits().iter().all(|s| s.gain > 0.0));
        let gained: f64 = net.splits().iter().map(|s| s.gain).sum();
        prop_assert!((net.score() - net.initial_score() - gained).abs() < 1e-6);
    }

    #[test]
    fn network_samples_parents_first(rows in parent_sets(), seed in any::<u64>()) {
        let (genes, net) = network(rows, &NetworkConfig::default());
        let order = net.sampling_order();
        prop_assert_eq!(order.len(), genes.genome_length());

        let mut position = vec![0usize; order.len()];
        for (i, &var) in order.iter().enumerate() {
            position[var] = i;
        }
        for var in 0..order.len() {
            for &parent in net.graph().parents(var) {
                prop_assert!(position[parent] < position[var]);
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert_eq!(net.sample_bits(&mut rng).len(), genes.genome_length());
    }

    #[test]
    fn network_sampling_leaves_leaves_untouched(rows in parent_sets(), seed in any::<u64>()) {
        let (genes, net) = network(rows, &NetworkConfig::default().with_split_penalty(0.5));
        let leaves = |net: &BayesianNetwork| -> Vec<(usize, usize, f64)> {
            (0..genes.genome_length())
                .flat_map(|var| net.forest().leaves(net.tree(var)))
                .filter_map(|id| net.forest().leaf(id))
                .map(|leaf| (leaf.n(), leaf.n1(), leaf.probability()))
                .collect()
        };
        let before = leaves(&net);

        let mut first = StdRng::seed_from_u64(seed);
        let mut second = first.clone();
        let a: Vec<Vec<bool>> = (0..8).map(|_| net.sample_bits(&mut first)).collect();
        let b: Vec<Vec<bool>> = (0..8).map(|_| net.sample_bits(&mut second)).collect();

        prop_assert_eq!(a, b);
        prop_assert_eq!(leaves(&net), before);
    }

    #[test]
    fn network_min_split_floor_above_parent_count_blocks_everything(rows in parent_sets()) {
        let n = rows.len();
        let (_, net) = network(rows, &NetworkConfig::default().with_min_split(n + 1));
        prop_assert!(net.splits().is_empty());
    }

    #[test]
    fn network_is_deterministic(rows in parent_sets()) {
        let config = NetworkConfig::default().with_split_penalty(0.5);
        let (_, a) = network(rows.clone(), &config);
        let (_, b) = network(rows, &config);
        prop_assert_eq!(a.to_string(), b.to_string());
        prop_assert_eq!(a.splits(), b.splits());
    }

    // ==================== Operator Properties ====================

    #[test]
    fn tournament_selection_in_bounds(
        fitnesses in prop::collection::vec(0.0f64..100.0, 1..50),
        tournament_size in 1usize..10
    ) {
        let mut rng = rand::thread_rng();
        let genome = BitString::zeros(4);
        let pool: Vec<(&BitString, f64)> = fitnesses.iter().map(|&f| (&genome, f)).collect();
        let selection = TournamentSelection::new(tournament_size);
        let idx = selection.select(&pool, &mut rng);
        prop_assert!(idx < pool.len());
    }

    #[test]
    fn restricted_tournament_never_loses_the_best(
        parents in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 2..20),
        children in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 1..20),
        window in 1usize..6,
        seed in any::<u64>()
    ) {
        let fitness = OneMax::new(8);
        let mut population: Population<BitString, usize> =
            parents.into_iter().map(|b| Individual::new(BitString::new(b))).collect();
        population.evaluate(&fitness);
        let before = population.best().and_then(|i| i.fitness).unwrap();

        let mut offspring: Population<BitString, usize> =
            children.into_iter().map(|b| Individual::new(BitString::new(b))).collect();
        offspring.evaluate(&fitness);

        let mut rng = StdRng::seed_from_u64(seed);
        let rtr = ReplacementStrategy::RestrictedTournament { window_size: window };
        let size = population.len();
        rtr.apply(&mut population, offspring.into_iter().collect(), &mut rng);

        prop_assert_eq!(population.len(), size);
        prop_assert!(population.best().and_then(|i| i.fitness).unwrap() >= before);
    }

    // ==================== BitString Properties ====================

    #[test]
    fn bit_string_count_consistency(bits in prop::collection::vec(any::<bool>(), 1..100)) {
        let genome = BitString::new(bits.clone());
        prop_assert_eq!(genome.count_ones(), bits.iter().filter(|&&b| b).count());
        prop_assert_eq!(BitString::parse(&genome.to_string()).unwrap(), genome);
    }

    #[test]
    fn bit_string_hamming_symmetric(
        a in prop::collection::vec(any::<bool>(), 16),
        b in prop::collection::vec(any::<bool>(), 16)
    ) {
        let ga = BitString::new(a);
        let gb = BitString::new(b);
        prop_assert_eq!(ga.hamming_distance(&gb), gb.hamming_distance(&ga));
        prop_assert_eq!(ga.hamming_distance(&ga), 0);
    }
}
