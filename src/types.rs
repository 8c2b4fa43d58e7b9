/// Identifier for a recipe store instance (used in logs and errors).
/// Examples: `recipes.jsonl`, `in_memory`
pub type StoreId = String;
/// Single ingredient line as written in a recipe.
/// Examples: `salt`, `2 cloves garlic`
pub type Ingredient = String;
/// Preparation step text.
/// Example: `Simmer the sauce for ten minutes.`
pub type Step = String;
/// Recipe category label.
/// Examples: `breakfast`, `vegetarian`
pub type Category = String;
/// Service name under which credentials are stored.
/// Example: `weekly-menu`
pub type ServiceName = String;
/// Account name under which credentials are stored.
/// Example: `me@example.com`
pub type UserName = String;
/// Mailbox address used for delivery.
/// Example: `me@example.com`
pub type MailAddress = String;
/// Raw JSON document as returned by a store before decoding.
pub type Document = serde_json::Value;
