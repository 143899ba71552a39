use std::collections::BTreeMap;

use varda_core::State;

use crate::Variable;

/// The stored values of one variable, in the order they were produced.
///
/// Scalar variables such as costs are stored as vectors of length one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series(Vec<State>);

impl Series {
    /// The most recent value.
    ///
    /// For [`Variable::Analysis`] this is the converged estimate.
    #[must_use]
    pub fn last(&self) -> Option<&State> {
        self.0.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[State] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, value: State) {
        self.0.push(value);
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The stored variables of an executed case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Results {
    series: BTreeMap<Variable, Series>,
}

impl Results {
    /// Returns the series of `variable`, if it was stored.
    #[must_use]
    pub fn get(&self, variable: Variable) -> Option<&Series> {
        self.series.get(&variable)
    }

    /// The analysis: the last value of [`Variable::Analysis`].
    #[must_use]
    pub fn analysis(&self) -> Option<&State> {
        self.get(Variable::Analysis).and_then(Series::last)
    }

    /// Stored variables and their series, in [`Variable`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Series)> {
        self.series.iter().map(|(variable, series)| (*variable, series))
    }

    /// Ensures `variable` has a (possibly empty) series.
    pub(crate) fn store(&mut self, variable: Variable) {
        self.series.entry(variable).or_default();
    }

    /// Appends to `variable` if it is stored, returning the updated series.
    pub(crate) fn push(&mut self, variable: Variable, value: State) -> Option<&Series> {
        let series = self.series.get_mut(&variable)?;
        series.push(value);
        Some(series)
    }
}
