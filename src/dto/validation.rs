//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a controller seat is spelled `PLAYER_<n>` with `n >= 1`.
///
/// # Examples
///
/// ```ignore
/// validate_controller_player("PLAYER_1") // Ok
/// validate_controller_player("player_1") // Err - lowercase prefix
/// validate_controller_player("PLAYER_0") // Err - seats start at 1
/// ```
pub fn validate_controller_player(player: &str) -> Result<(), ValidationError> {
    let Some(number) = player.strip_prefix("PLAYER_") else {
        let mut err = ValidationError::new("controller_player_prefix");
        err.message = Some(format!("Player must look like PLAYER_<n> (got {player})").into());
        return Err(err);
    };

    match number.parse::<u32>() {
        Ok(n) if n >= 1 && number.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        _ => {
            let mut err = ValidationError::new("controller_player_number");
            err.message = Some("Player number must be a positive integer".into());
            Err(err)
        }
    }
}

/// 0-based index of a `PLAYER_<n>` seat, if well-formed.
pub fn player_seat_index(player: &str) -> Option<usize> {
    validate_controller_player(player).ok()?;
    player
        .strip_prefix("PLAYER_")?
        .parse::<usize>()
        .ok()?
        .checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_controller_player_valid() {
        assert!(validate_controller_player("PLAYER_1").is_ok());
        assert!(validate_controller_player("PLAYER_12").is_ok());
    }

    #[test]
    fn test_validate_controller_player_invalid() {
        assert!(validate_controller_player("PLAYER_0").is_err());
        assert!(validate_controller_player("PLAYER_").is_err());
        assert!(validate_controller_player("PLAYER_+1").is_err());
        assert!(validate_controller_player("player_1").is_err());
        assert!(validate_controller_player("1").is_err());
    }

    #[test]
    fn seat_index_is_zero_based() {
        assert_eq!(player_seat_index("PLAYER_1"), Some(0));
        assert_eq!(player_seat_index("PLAYER_3"), Some(2));
        assert_eq!(player_seat_index("PLAYER_0"), None);
    }
}
