use procgen::codec::parse;
use procgen::{Engine, Mode, Template};
use proptest::prelude::*;
use std::collections::HashSet;

fn template(sizes: &[usize]) -> String {
    let lists = sizes
        .iter()
        .enumerate()
        .map(|(list, size)| {
            let options = (0..*size)
                .map(|option| format!("v{}_{}", list, option))
                .collect::<Vec<_>>()
                .join(", ");
            format!("- !ProcList [{}]\n", options)
        })
        .collect::<String>();
    format!("items:\n{}", lists)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_count_matches_enumeration(sizes in prop::collection::vec(1usize..5, 1..5)) {
        let engine = Engine::new(0);
        let document = parse(&template(&sizes), "prop.yaml").unwrap();
        let expected: usize = sizes.iter().product();
        prop_assert_eq!(engine.count(&document).unwrap(), expected as u128);

        let template = Template::split(&document).unwrap();
        let variations = engine
            .generate(Mode::Exhaustive, &template, usize::MAX)
            .unwrap()
            .map(|variation| format!("{:?}", variation.unwrap().0))
            .collect::<Vec<_>>();
        prop_assert_eq!(variations.len(), expected);

        let distinct = variations.iter().collect::<HashSet<_>>();
        prop_assert_eq!(distinct.len(), expected);
    }

    #[test]
    fn prop_same_seed_same_samples(seed in any::<u64>(), sizes in prop::collection::vec(1usize..6, 1..4)) {
        let document = parse(&template(&sizes), "prop.yaml").unwrap();
        let template = Template::split(&document).unwrap();
        let draw = |engine: Engine| {
            engine
                .generate(Mode::Sample, &template, 10)
                .unwrap()
                .map(|variation| format!("{:?}", variation.unwrap().0))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(draw(Engine::new(seed)), draw(Engine::new(seed)));
    }

    #[test]
    fn prop_restrict_count_is_the_cap(amount in 1usize..20, sizes in prop::collection::vec(1usize..5, 1..4)) {
        let inner = template(&sizes).replace("items:\n", "").replace("- ", "  - ");
        let text = format!("!ProcRestrictCombinations\namount: {}\nitem:\n{}", amount, inner);
        let document = parse(&text, "prop.yaml").unwrap();
        let engine = Engine::new(0);
        prop_assert_eq!(engine.count(&document).unwrap(), amount as u128);

        let template = Template::split(&document).unwrap();
        let produced = engine
            .generate(Mode::Exhaustive, &template, usize::MAX)
            .unwrap()
            .count();
        prop_assert_eq!(produced, amount);
    }
}
