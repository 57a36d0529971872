//! Name helpers for type tags and field matching

/// Short type tag for `T`: the last path segment with generics stripped.
///
/// `my_app::models::User` becomes `User`. Two types with the same name in
/// different modules share a tag; keeping tags unique is up to the caller.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Convert a field or column name to PascalCase
///
/// Used to match lazy-update field names regardless of whether they were
/// written as columns (`updated_at`), struct fields or camelCase keys.
pub fn to_pascal_case(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
