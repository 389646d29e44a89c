use std::error::Error;

use motifmine::{enrich, plan_batch, EnrichConfig, Feature, InputMap, MotifCase};

/// Synthesise a convolution corpus with a planted three-filter motif and a
/// noise tail, then mine it.
fn main() -> Result<(), Box<dyn Error>> {
    let mut map = InputMap::new();
    for key in 1..=25 {
        map.insert(
            key,
            vec![
                Feature::Convolution {
                    filter_id: 7,
                    contribution: 1.0,
                    position: 10,
                },
                Feature::Convolution {
                    filter_id: 19,
                    contribution: 1.0,
                    position: 20,
                },
                Feature::Convolution {
                    filter_id: 42,
                    contribution: 1.0,
                    position: 32,
                },
            ],
        );
    }
    for key in 26..=60 {
        map.insert(
            key,
            vec![
                Feature::Convolution {
                    filter_id: 100 + key,
                    contribution: 0.5,
                    position: 5,
                },
                Feature::Convolution {
                    filter_id: 200 + key,
                    contribution: 0.5,
                    position: 30,
                },
                Feature::Convolution {
                    filter_id: 300 + key,
                    contribution: 0.5,
                    position: 55,
                },
            ],
        );
    }

    let cfg = EnrichConfig::new()
        .with_motif_size(3)
        .with_filter_len(8)
        .with_min_count(8);

    let plan = plan_batch(map.len(), 3, MotifCase::Convolution, &cfg)?;
    println!("planned: {plan}");

    let table = enrich(map, &cfg)?;
    println!("columns: {:?}", table.column_names());
    println!("emitted {} rows", table.len());
    for row in table.rows.iter().take(5) {
        println!(
            "motif {:?} gaps {:?} span [{:?}, {:?}] in sequence {} (count {})",
            row.motif, row.gaps, row.start, row.end, row.data_index, row.count
        );
    }

    Ok(())
}
