use nom::{
    character::complete::{char, digit1, space0},
    combinator::map_res,
    sequence::separated_pair,
    IResult, Parser,
};

fn games_won(input: &str) -> IResult<&str, i32> {
    map_res(digit1, |s: &str| s.parse::<i32>()).parse(input)
}

/// Parse a set score: `3:1` or `3 : 1`
fn set_score(input: &str) -> IResult<&str, (i32, i32)> {
    separated_pair(games_won, (space0, char(':'), space0), games_won).parse(input)
}

/// Score cell text as (player, opponent); `None` for walkovers and junk
pub fn parse_score(text: &str) -> Option<(i32, i32)> {
    match set_score(text.trim()) {
        Ok((rest, score)) if rest.trim().is_empty() => Some(score),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("3:1"), Some((3, 1)));
        assert_eq!(parse_score(" 2 : 3 "), Some((2, 3)));
        assert_eq!(parse_score("11:0"), Some((11, 0)));
    }

    #[test]
    fn test_rejects_non_scores() {
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("W/O"), None);
        assert_eq!(parse_score("3:"), None);
        assert_eq!(parse_score("3:1 (отказ)"), None);
    }
}
