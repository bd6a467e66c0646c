/// A single cell in the warping matrix, the best path that ends a dataset section at this
/// reference boundary
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Step {
    /// The total score of the path up till now
    pub(crate) score: f64,
    /// The number of reference sections the last dataset section was stretched over
    pub(crate) length: u16,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            score: f64::NEG_INFINITY,
            length: 0,
        }
    }
}

/// The dynamic programming matrix, rows are dataset sections, columns are reference section
/// boundaries (`0..=reference_sections`).
#[derive(Debug)]
pub(crate) struct WarpMatrix {
    value: Vec<Vec<Step>>,
    sections: usize,
    reference_sections: usize,
}

impl WarpMatrix {
    pub(crate) fn new(sections: usize, reference_sections: usize) -> Self {
        Self {
            value: vec![vec![Step::default(); reference_sections + 1]; sections],
            sections,
            reference_sections,
        }
    }

    /// Store the step if it improves the cell
    pub(crate) fn improve(&mut self, index: [usize; 2], score: f64, length: usize) {
        let cell = &mut self[index];
        if score > cell.score {
            *cell = Step {
                score,
                length: length as u16,
            };
        }
    }

    /// The reference boundary with the best score for the last dataset section
    pub(crate) fn best_end(&self) -> Option<usize> {
        self.value
            .last()?
            .iter()
            .enumerate()
            .filter(|(_, step)| step.score.is_finite())
            .max_by(|a, b| a.1.score.total_cmp(&b.1.score))
            .map(|(index, _)| index)
    }

    /// Follow the path back from the given end, returns the reference boundary for every dataset
    /// section boundary (`sections + 1` elements).
    pub(crate) fn trace_path(&self, end: usize) -> Vec<usize> {
        let mut boundaries = vec![0; self.sections + 1];
        let mut position = end.min(self.reference_sections);
        for section in (0..self.sections).rev() {
            boundaries[section + 1] = position;
            position = position.saturating_sub(self.value[section][position].length as usize);
        }
        boundaries[0] = position;
        boundaries
    }
}

impl std::ops::Index<[usize; 2]> for WarpMatrix {
    type Output = Step;
    fn index(&self, index: [usize; 2]) -> &Self::Output {
        assert!(index[0] < self.sections);
        assert!(index[1] <= self.reference_sections);
        &self.value[index[0]][index[1]]
    }
}

impl std::ops::IndexMut<[usize; 2]> for WarpMatrix {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut Self::Output {
        assert!(index[0] < self.sections);
        assert!(index[1] <= self.reference_sections);
        &mut self.value[index[0]][index[1]]
    }
}
