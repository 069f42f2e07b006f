//! Naming conventions and helpers for relata schemas.
//!
//! This crate provides consistent naming functions for generated schema
//! objects: constraint names, implicit join entities and case conversion.
//! It has no dependencies and can be used by any other relata crate.

// ============================================================================
// Case Conversion
// ============================================================================

/// Convert snake_case (or kebab-case) to PascalCase.
///
/// Characters that are not preceded by a separator are kept as-is, so an
/// already PascalCase or camelCase input only gets its first letter raised.
///
/// # Examples
/// ```
/// use relata_naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("user_course"), "UserCourse");
/// assert_eq!(to_pascal_case("userCourse"), "UserCourse");
/// assert_eq!(to_pascal_case("tag"), "Tag");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize = true;
    for c in s.chars() {
        let is_separator = c == '_' || c == '-' || c == ' ';
        if is_separator {
            capitalize = true;
            continue;
        }
        let ch = if capitalize {
            c.to_ascii_uppercase()
        } else {
            c
        };
        capitalize = false;
        result.push(ch);
    }
    result
}

/// Convert any supported case to camelCase.
///
/// # Examples
/// ```
/// use relata_naming::to_camel_case;
///
/// assert_eq!(to_camel_case("user_course"), "userCourse");
/// assert_eq!(to_camel_case("UserCourse"), "userCourse");
/// ```
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert PascalCase, camelCase or kebab-case to snake_case.
///
/// Acronyms are kept together: `HTTPServer` becomes `http_server`.
///
/// # Examples
/// ```
/// use relata_naming::to_snake_case;
///
/// assert_eq!(to_snake_case("UserCourse"), "user_course");
/// assert_eq!(to_snake_case("postTag"), "post_tag");
/// assert_eq!(to_snake_case("user_id"), "user_id");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '_' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        }

        result.push(c.to_ascii_lowercase());
    }

    result
}

// ============================================================================
// Implicit Join Naming
// ============================================================================

/// Order two entity names the way implicit join entities store them.
///
/// The alphabetically smaller name becomes column `A`, the other column `B`.
pub fn join_table_endpoints<'a>(left: &'a str, right: &'a str) -> (&'a str, &'a str) {
    if left <= right {
        (left, right)
    } else {
        (right, left)
    }
}

/// Generate the name of an implicit many-to-many join entity.
/// Format: {prefix}{A}To{B} with A and B sorted alphabetically.
///
/// # Examples
/// ```
/// use relata_naming::build_join_table_name;
///
/// assert_eq!(build_join_table_name("_", "Tag", "Post"), "_PostToTag");
/// assert_eq!(build_join_table_name("", "Post", "Tag"), "PostToTag");
/// ```
pub fn build_join_table_name(prefix: &str, left: &str, right: &str) -> String {
    let (a, b) = join_table_endpoints(left, right);
    format!("{}{}To{}", prefix, a, b)
}

// ============================================================================
// Constraint Naming
// ============================================================================

/// Generate primary key constraint name.
/// Format: pk_{entity}
pub fn build_primary_key_name(entity: &str) -> String {
    format!("pk_{}", to_snake_case(entity))
}

/// Generate unique constraint name from entity name, columns, and optional user-provided key.
/// Always includes the entity name to avoid conflicts across entities.
/// Uses double underscore to separate entity name from the rest.
/// Format: uq_{entity}__{key} or uq_{entity}__{col1}_{col2}...
pub fn build_unique_constraint_name(entity: &str, columns: &[String], key: Option<&str>) -> String {
    let entity = to_snake_case(entity);
    match key {
        Some(k) => format!("uq_{}__{}", entity, k),
        None => format!("uq_{}__{}", entity, columns.join("_")),
    }
}

/// Generate foreign key constraint name from entity name, columns, and optional user-provided key.
/// Format: fk_{entity}__{key} or fk_{entity}__{col1}_{col2}...
pub fn build_foreign_key_name(entity: &str, columns: &[String], key: Option<&str>) -> String {
    let entity = to_snake_case(entity);
    match key {
        Some(k) => format!("fk_{}__{}", entity, k),
        None => format!("fk_{}__{}", entity, columns.join("_")),
    }
}
