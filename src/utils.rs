#[allow(unused)]
use crate::prelude::*;

/// Index of the largest component; ties go to the lowest index.
/// Returns `None` for an empty vector.
pub fn argmax(v: &Array1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in v.iter().enumerate() {
        match best {
            Some((_, current)) if x <= current => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest() {
        assert_eq!(argmax(&array![0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&array![-3.0, -1.0]), Some(1));
    }

    #[test]
    fn argmax_ties_go_to_first() {
        assert_eq!(argmax(&array![0.0, 0.0, 0.0]), Some(0));
        assert_eq!(argmax(&array![0.2, 0.9, 0.9]), Some(1));
    }

    #[test]
    fn argmax_of_empty_is_none() {
        assert_eq!(argmax(&Array1::<f64>::zeros(0)), None);
    }
}
