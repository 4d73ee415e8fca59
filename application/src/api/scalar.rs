//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute of GraphQL
/// wrappers around string-like domain types (sales channels, coupon codes).
///
/// The wrapped `As` type is written with its [`Display`] impl and read with
/// its [`FromStr`] impl, so the GraphQL input is validated exactly as the
/// domain validates it.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Writes the wrapped `As` value as a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Reads the wrapper from a string scalar [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the input value is not a string, or the `As` type rejects it.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: From<As> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let name = T::name(&()).map(|n| n.to_string()).unwrap_or_default();
        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse input scalar `{name}`: expected string input \
                 value, found: {input}",
            )
        })?;
        s.parse::<As>().map(T::from).map_err(|e| {
            format!("Cannot parse input scalar `{name}` from \"{s}\": {e}")
        })
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};

    use crate::api::pricing::{Channel, CouponCode};

    use super::Via;

    type Scalar = DefaultScalarValue;

    #[test]
    fn reads_and_writes_exact_string() {
        let input = InputValue::<Scalar>::scalar("WALK-IN".to_owned());

        let channel: Channel =
            Via::<service::domain::promotion::Channel>::from_input(&input)
                .unwrap();

        assert_eq!(channel.to_string(), "WALK-IN");
        assert_eq!(
            Via::<service::domain::promotion::Channel>::to_output::<_, Scalar>(
                &channel,
            )
            .as_string_value(),
            Some("WALK-IN"),
        );
    }

    #[test]
    fn rejects_non_string_input() {
        let input = InputValue::<Scalar>::scalar(42);

        let err =
            Via::<service::domain::promotion::coupon::Code>::from_input::<
                CouponCode,
                Scalar,
            >(&input)
            .unwrap_err();

        assert!(err.contains("expected string input"), "{err}");
    }
}
