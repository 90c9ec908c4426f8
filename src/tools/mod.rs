//! Tool handlers for the Facebook Graph Marketing API.
//!
//! Every tool is a `ToolHandler` registered in one `ToolRegistry`; the
//! protocol adapters reach them only through the `Dispatcher`.

mod args;
mod dispatcher;
mod insights_format;
mod registry;

pub use dispatcher::Dispatcher;
pub use insights_format::format_insights;
pub use registry::{ToolFuture, ToolHandler, ToolRegistry};

#[cfg(test)]
pub(crate) use registry::tests::EchoTool;

// Tool handler implementations
mod account_activities;
mod account_details;
mod account_insights;
mod ad_creatives;
mod ad_thumbnails;
mod check_auth;
mod fetch_pagination;
mod list_ad_accounts;
mod logout;

pub use account_activities::AccountActivitiesHandler;
pub use account_details::AccountDetailsHandler;
pub use account_insights::AccountInsightsHandler;
pub use ad_creatives::AdCreativesHandler;
pub use ad_thumbnails::AdThumbnailsHandler;
pub use check_auth::{CheckAuthHandler, describe_status};
pub use fetch_pagination::FetchPaginationHandler;
pub use list_ad_accounts::ListAdAccountsHandler;
pub use logout::LogoutHandler;

use std::sync::Arc;

use crate::facebook::GraphClient;

/// Registry holding every Facebook Ads tool, in the order they are advertised.
pub fn build_registry(client: Arc<GraphClient>) -> ToolRegistry {
    ToolRegistry::new()
        .register_handler(CheckAuthHandler::new(client.clone()))
        .register_handler(LogoutHandler::new(client.clone()))
        .register_handler(ListAdAccountsHandler::new(client.clone()))
        .register_handler(FetchPaginationHandler::new(client.clone()))
        .register_handler(AccountDetailsHandler::new(client.clone()))
        .register_handler(AccountInsightsHandler::new(client.clone()))
        .register_handler(AccountActivitiesHandler::new(client.clone()))
        .register_handler(AdCreativesHandler::new(client.clone()))
        .register_handler(AdThumbnailsHandler::new(client))
}
