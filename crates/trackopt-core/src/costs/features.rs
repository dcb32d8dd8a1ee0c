//! Variable-by-weight feature matrix.

/// Dense row-major matrix with one row per variable and one column per
/// weight.
///
/// Adding rows appends to the buffer. Adding columns reallocates and
/// copies each row into the wider layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    values: Vec<f64>,
    num_variables: usize,
    num_weights: usize,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_weights(&self) -> usize {
        self.num_weights
    }

    /// Grow to at least `num_variables` rows and `num_weights` columns.
    /// New cells are zero.
    pub fn resize(&mut self, num_variables: usize, num_weights: usize) {
        if num_weights > self.num_weights {
            let mut widened = vec![0.0; self.num_variables * num_weights];
            for (row, chunk) in self.rows().enumerate() {
                let start = row * num_weights;
                widened[start..start + chunk.len()].copy_from_slice(chunk);
            }
            self.values = widened;
            self.num_weights = num_weights;
        }
        if num_variables > self.num_variables {
            self.values.resize(num_variables * self.num_weights, 0.0);
            self.num_variables = num_variables;
        }
    }

    /// Accumulate `value` into cell `(variable, weight)`, growing as needed.
    pub fn add_feature(&mut self, variable: usize, weight: usize, value: f64) {
        self.resize(
            self.num_variables.max(variable + 1),
            self.num_weights.max(weight + 1),
        );
        self.values[variable * self.num_weights + weight] += value;
    }

    pub fn get(&self, variable: usize, weight: usize) -> f64 {
        if variable < self.num_variables && weight < self.num_weights {
            self.values[variable * self.num_weights + weight]
        } else {
            0.0
        }
    }

    fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.num_variables)
            .map(|row| &self.values[row * self.num_weights..(row + 1) * self.num_weights])
    }

    /// `features · weights`: one cost per variable. Missing weights count
    /// as zero.
    pub fn dot(&self, weights: &[f64]) -> Vec<f64> {
        self.rows()
            .map(|row| row.iter().zip(weights).map(|(f, w)| f * w).sum())
            .collect()
    }

    /// Columns as rows: `num_weights` vectors of `num_variables` entries.
    pub fn transposed(&self) -> Vec<Vec<f64>> {
        (0..self.num_weights)
            .map(|weight| {
                (0..self.num_variables)
                    .map(|variable| self.values[variable * self.num_weights + weight])
                    .collect()
            })
            .collect()
    }
}
