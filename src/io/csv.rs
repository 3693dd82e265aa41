/*!
# I/O Utilities for Saving Simulation Results to CSV

This module provides functions to save chain state matrices and visit frequencies to CSV
files. Enable via the `csv` feature.
*/

use std::fs::File;
use std::path::Path;

use csv::Writer;
use ndarray::ArrayView2;

use crate::error::Result;
use crate::stats::TargetComparison;

/**
Saves a chain state matrix (iteration × chain) as a CSV file in long format.

The resulting CSV file will have:
- A header row `iteration,chain,state`.
- One row per entry of `states`, iteration-major. Iterations are numbered from 1.

# Examples

```rust
use discrete_mh::io::csv::save_csv;
use ndarray::arr2;

// 2 iterations of 3 chains.
let states = arr2(&[[0, 1, 2], [1, 1, 0]]);
let path = std::env::temp_dir().join("discrete_mh_states.csv");
save_csv(states.view(), &path).expect("Expecting saving data to succeed");
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub fn save_csv<P: AsRef<Path>>(states: ArrayView2<usize>, filename: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(filename)?);
    wtr.write_record(["iteration", "chain", "state"])?;
    for ((iteration, chain), state) in states.indexed_iter() {
        wtr.write_record(&[
            (iteration + 1).to_string(),
            chain.to_string(),
            state.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Saves a target comparison as `state,count,frequency,target`, one row per state.
pub fn save_frequencies_csv<P: AsRef<Path>>(cmp: &TargetComparison, filename: P) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(filename)?);
    wtr.write_record(["state", "count", "frequency", "target"])?;
    for (state, ((count, freq), target)) in cmp
        .frequencies
        .counts
        .iter()
        .zip(cmp.empirical.iter())
        .zip(cmp.target.iter())
        .enumerate()
    {
        wtr.write_record(&[
            state.to_string(),
            count.to_string(),
            freq.to_string(),
            target.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
