//! Transformer trait for mapping extracted items

use eyre::Result;

/// Transformer trait for mapping one item into another
///
/// # Example
/// ```
/// use tabload::etl::Transformer;
/// use eyre::Result;
///
/// struct Upper;
///
/// impl Transformer for Upper {
///     type Input = String;
///     type Output = String;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input.to_uppercase())
///     }
/// }
///
/// assert_eq!(Upper.transform("orders".to_string()).unwrap(), "ORDERS");
/// ```
pub trait Transformer {
    /// Input item type
    type Input;

    /// Output item type after transformation
    type Output;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if the item cannot be mapped
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform multiple items (default batch implementation)
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }
}
