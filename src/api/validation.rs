use super::ApiError;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::bad_request(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("user", 1).is_ok());
        assert!(validate_id("user", 12345).is_ok());
        assert!(validate_id("user", 0).is_err());
        assert!(validate_id("bank account", -1).is_err());
    }
}
