use std::collections::HashSet;

/// Drop repeated entries, keeping the first occurrence of each.
pub fn unique_str<T: AsRef<str>>(input: &[T]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(input.len());
    let mut out = Vec::with_capacity(input.len());
    for val in input {
        let val = val.as_ref();
        if seen.insert(val) {
            out.push(val.to_string());
        }
    }
    out
}

pub fn contains<T: AsRef<str>>(items: &[T], target: &str) -> bool {
    items.iter().any(|v| v.as_ref() == target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_keeps_first_occurrence_order() {
        assert_eq!(
            unique_str(&["b", "a", "b", "c", "a"]),
            vec!["b", "a", "c"]
        );
        assert!(unique_str::<String>(&[]).is_empty());
    }

    #[test]
    fn contains_is_exact() {
        assert!(contains(&["x", "y"], "y"));
        assert!(!contains(&["x", "y"], "Y"));
        assert!(!contains::<&str>(&[], "y"));
    }
}
