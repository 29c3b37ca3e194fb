//! Resource operations of the billing API.
//!
//! Each line of the table below expands to one method on [`BillingClient`]:
//!
//! | kind     | verb   | signature                                   |
//! |----------|--------|---------------------------------------------|
//! | `list`   | GET    | `(ids.., &ListParams) -> Result<Pager<T>>`  |
//! | `get`    | GET    | `(ids..) -> Result<T>`                      |
//! | `create` | POST   | `(ids.., &B) -> Result<T>`                  |
//! | `update` | PUT    | `(ids.., &B) -> Result<T>`                  |
//! | `action` | PUT    | `(ids..) -> Result<T>`                      |
//! | `remove` | DELETE | `(ids..) -> Result<T>`                      |
//!
//! Identifier arguments accept a raw ID or an alternate key such as
//! `code-bob`, `uuid-…` or `number-1001`.

use billow_core::{ApiRequest, HttpTransport, Identifier, ListParams, Method, PathTemplate};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{BillingClient, Pager, Result};

macro_rules! operations {
    ($(
        $(#[$doc:meta])*
        $kind:ident $name:ident($template:literal $(, $param:ident)*);
    )*) => {
        $(
            operation!($(#[$doc])* $kind $name($template $(, $param)*));
        )*
    };
}

macro_rules! operation {
    ($(#[$doc:meta])* list $name:ident($template:literal $(, $param:ident)*)) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns an error if the path or parameters cannot be built.
        pub fn $name<T: DeserializeOwned>(
            &self,
            $($param: impl Into<Identifier>,)*
            params: &ListParams,
        ) -> Result<Pager<T, C>> {
            const TEMPLATE: PathTemplate = PathTemplate::new($template);
            let path = self.path(
                &TEMPLATE,
                &[$((stringify!($param), Into::<Identifier>::into($param).to_path_segment().as_str()),)*],
            )?;
            self.pager(&path, params)
        }
    };
    ($(#[$doc:meta])* get $name:ident($template:literal $(, $param:ident)*)) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns the call or decode error.
        pub async fn $name<T: DeserializeOwned>(
            &self,
            $($param: impl Into<Identifier>,)*
        ) -> Result<T> {
            const TEMPLATE: PathTemplate = PathTemplate::new($template);
            let path = self.path(
                &TEMPLATE,
                &[$((stringify!($param), Into::<Identifier>::into($param).to_path_segment().as_str()),)*],
            )?;
            self.get(&path).await
        }
    };
    ($(#[$doc:meta])* create $name:ident($template:literal $(, $param:ident)*)) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns the serialization, call or decode error.
        pub async fn $name<B, T>(
            &self,
            $($param: impl Into<Identifier>,)*
            body: &B,
        ) -> Result<T>
        where
            B: Serialize + ?Sized,
            T: DeserializeOwned,
        {
            const TEMPLATE: PathTemplate = PathTemplate::new($template);
            let path = self.path(
                &TEMPLATE,
                &[$((stringify!($param), Into::<Identifier>::into($param).to_path_segment().as_str()),)*],
            )?;
            self.post(&path, body).await
        }
    };
    ($(#[$doc:meta])* update $name:ident($template:literal $(, $param:ident)*)) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns the serialization, call or decode error.
        pub async fn $name<B, T>(
            &self,
            $($param: impl Into<Identifier>,)*
            body: &B,
        ) -> Result<T>
        where
            B: Serialize + ?Sized,
            T: DeserializeOwned,
        {
            const TEMPLATE: PathTemplate = PathTemplate::new($template);
            let path = self.path(
                &TEMPLATE,
                &[$((stringify!($param), Into::<Identifier>::into($param).to_path_segment().as_str()),)*],
            )?;
            self.put(&path, body).await
        }
    };
    ($(#[$doc:meta])* action $name:ident($template:literal $(, $param:ident)*)) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns the call or decode error.
        pub async fn $name<T: DeserializeOwned>(
            &self,
            $($param: impl Into<Identifier>,)*
        ) -> Result<T> {
            const TEMPLATE: PathTemplate = PathTemplate::new($template);
            let path = self.path(
                &TEMPLATE,
                &[$((stringify!($param), Into::<Identifier>::into($param).to_path_segment().as_str()),)*],
            )?;
            self.put_empty(&path).await
        }
    };
    ($(#[$doc:meta])* remove $name:ident($template:literal $(, $param:ident)*)) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns the call or decode error.
        pub async fn $name<T: DeserializeOwned>(
            &self,
            $($param: impl Into<Identifier>,)*
        ) -> Result<T> {
            const TEMPLATE: PathTemplate = PathTemplate::new($template);
            let path = self.path(
                &TEMPLATE,
                &[$((stringify!($param), Into::<Identifier>::into($param).to_path_segment().as_str()),)*],
            )?;
            self.delete(&path).await
        }
    };
}

const SITES: PathTemplate = PathTemplate::new("/sites");
const SITE: PathTemplate = PathTemplate::new("/sites/{site_id}");
const SUBSCRIPTION: PathTemplate =
    PathTemplate::new("/sites/{site_id}/subscriptions/{subscription_id}");

impl<C: HttpTransport> BillingClient<C> {
    /// List the sites the API key can access.
    ///
    /// The only operation not rooted under the client's site.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be serialized.
    pub fn list_sites<T: DeserializeOwned>(&self, params: &ListParams) -> Result<Pager<T, C>> {
        self.pager(SITES.as_str(), params)
    }

    /// Terminate a subscription immediately.
    ///
    /// `refund` is `full`, `partial` or `none`; the service default applies
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns the call or decode error.
    pub async fn terminate_subscription<T: DeserializeOwned>(
        &self,
        subscription_id: impl Into<Identifier>,
        refund: Option<&str>,
    ) -> Result<T> {
        let subscription_id = subscription_id.into().to_path_segment();
        let path = self.path(&SUBSCRIPTION, &[("subscription_id", subscription_id.as_str())])?;

        let mut request = ApiRequest::builder(Method::Delete, path);
        if let Some(refund) = refund {
            request = request.query("refund", refund);
        }
        self.executor().execute_json(&request.build()).await
    }

    /// The site this client is scoped to, as the service describes it.
    ///
    /// # Errors
    ///
    /// Returns the call or decode error.
    pub async fn get_site<T: DeserializeOwned>(&self) -> Result<T> {
        let path = self.path(&SITE, &[])?;
        self.get(&path).await
    }

    operations! {
        // Accounts
        /// List the site's accounts.
        list list_accounts("/sites/{site_id}/accounts");
        /// Create an account.
        create create_account("/sites/{site_id}/accounts");
        /// Fetch an account.
        get get_account("/sites/{site_id}/accounts/{account_id}", account_id);
        /// Update an account.
        update update_account("/sites/{site_id}/accounts/{account_id}", account_id);
        /// Deactivate an account.
        remove deactivate_account("/sites/{site_id}/accounts/{account_id}", account_id);
        /// Reactivate an inactive account.
        action reactivate_account("/sites/{site_id}/accounts/{account_id}/reactivate", account_id);
        /// Fetch an account's balance.
        get get_account_balance("/sites/{site_id}/accounts/{account_id}/balance", account_id);
        /// Fetch an account's acquisition data.
        get get_account_acquisition("/sites/{site_id}/accounts/{account_id}/acquisition", account_id);
        /// Update an account's acquisition data.
        update update_account_acquisition("/sites/{site_id}/accounts/{account_id}/acquisition", account_id);
        /// Remove an account's acquisition data.
        remove remove_account_acquisition("/sites/{site_id}/accounts/{account_id}/acquisition", account_id);
        /// List acquisition data across all accounts.
        ///
        /// Exposed as a [`Pager`] like every other list endpoint: the service
        /// answers with the list envelope, so cursors are followed rather
        /// than returning only the first page.
        list list_account_acquisition("/sites/{site_id}/acquisitions");
        /// Fetch an account's billing info.
        get get_billing_info("/sites/{site_id}/accounts/{account_id}/billing_info", account_id);
        /// Set an account's billing info.
        update update_billing_info("/sites/{site_id}/accounts/{account_id}/billing_info", account_id);
        /// Remove an account's billing info.
        remove remove_billing_info("/sites/{site_id}/accounts/{account_id}/billing_info", account_id);
        /// List an account's coupon redemptions.
        list list_account_coupon_redemptions("/sites/{site_id}/accounts/{account_id}/coupon_redemptions", account_id);
        /// Fetch an account's active coupon redemption.
        get get_active_coupon_redemption("/sites/{site_id}/accounts/{account_id}/coupon_redemptions/active", account_id);
        /// Redeem a coupon on an account.
        create create_coupon_redemption("/sites/{site_id}/accounts/{account_id}/coupon_redemptions/active", account_id);
        /// Remove an account's active coupon redemption.
        remove remove_coupon_redemption("/sites/{site_id}/accounts/{account_id}/coupon_redemptions/active", account_id);
        /// List an account's credit payments.
        list list_account_credit_payments("/sites/{site_id}/accounts/{account_id}/credit_payments", account_id);
        /// List an account's invoices.
        list list_account_invoices("/sites/{site_id}/accounts/{account_id}/invoices", account_id);
        /// Invoice an account's pending line items.
        create create_invoice("/sites/{site_id}/accounts/{account_id}/invoices", account_id);
        /// Preview the invoice of an account's pending line items.
        create preview_invoice("/sites/{site_id}/accounts/{account_id}/invoices/preview", account_id);
        /// List an account's line items.
        list list_account_line_items("/sites/{site_id}/accounts/{account_id}/line_items", account_id);
        /// Create a line item on an account.
        create create_line_item("/sites/{site_id}/accounts/{account_id}/line_items", account_id);
        /// List an account's notes.
        list list_account_notes("/sites/{site_id}/accounts/{account_id}/notes", account_id);
        /// Fetch one account note.
        get get_account_note("/sites/{site_id}/accounts/{account_id}/notes/{account_note_id}", account_id, account_note_id);
        /// List an account's shipping addresses.
        list list_shipping_addresses("/sites/{site_id}/accounts/{account_id}/shipping_addresses", account_id);
        /// Add a shipping address to an account.
        create create_shipping_address("/sites/{site_id}/accounts/{account_id}/shipping_addresses", account_id);
        /// Fetch a shipping address.
        get get_shipping_address("/sites/{site_id}/accounts/{account_id}/shipping_addresses/{shipping_address_id}", account_id, shipping_address_id);
        /// Update a shipping address.
        update update_shipping_address("/sites/{site_id}/accounts/{account_id}/shipping_addresses/{shipping_address_id}", account_id, shipping_address_id);
        /// Remove a shipping address.
        remove remove_shipping_address("/sites/{site_id}/accounts/{account_id}/shipping_addresses/{shipping_address_id}", account_id, shipping_address_id);
        /// List an account's subscriptions.
        list list_account_subscriptions("/sites/{site_id}/accounts/{account_id}/subscriptions", account_id);
        /// List an account's transactions.
        list list_account_transactions("/sites/{site_id}/accounts/{account_id}/transactions", account_id);

        // Coupons
        /// List the site's coupons.
        list list_coupons("/sites/{site_id}/coupons");
        /// Create a coupon.
        create create_coupon("/sites/{site_id}/coupons");
        /// Fetch a coupon.
        get get_coupon("/sites/{site_id}/coupons/{coupon_id}", coupon_id);
        /// Update a coupon.
        update update_coupon("/sites/{site_id}/coupons/{coupon_id}", coupon_id);
        /// List a bulk coupon's unique codes.
        list list_unique_coupon_codes("/sites/{site_id}/coupons/{coupon_id}/unique_coupon_codes", coupon_id);
        /// Fetch a unique coupon code.
        get get_unique_coupon_code("/sites/{site_id}/unique_coupon_codes/{unique_coupon_code_id}", unique_coupon_code_id);
        /// Deactivate a unique coupon code.
        remove deactivate_unique_coupon_code("/sites/{site_id}/unique_coupon_codes/{unique_coupon_code_id}", unique_coupon_code_id);
        /// Restore a deactivated unique coupon code.
        action reactivate_unique_coupon_code("/sites/{site_id}/unique_coupon_codes/{unique_coupon_code_id}/restore", unique_coupon_code_id);

        // Credit payments
        /// List the site's credit payments.
        list list_credit_payments("/sites/{site_id}/credit_payments");
        /// Fetch a credit payment.
        get get_credit_payment("/sites/{site_id}/credit_payments/{credit_payment_id}", credit_payment_id);

        // Custom fields
        /// List the site's custom field definitions.
        list list_custom_field_definitions("/sites/{site_id}/custom_field_definitions");
        /// Fetch a custom field definition.
        get get_custom_field_definition("/sites/{site_id}/custom_field_definitions/{custom_field_definition_id}", custom_field_definition_id);

        // Invoices
        /// List the site's invoices.
        list list_invoices("/sites/{site_id}/invoices");
        /// Fetch an invoice.
        get get_invoice("/sites/{site_id}/invoices/{invoice_id}", invoice_id);
        /// Collect a pending or past due invoice.
        action collect_invoice("/sites/{site_id}/invoices/{invoice_id}/collect", invoice_id);
        /// Mark an invoice as failed.
        action fail_invoice("/sites/{site_id}/invoices/{invoice_id}/mark_failed", invoice_id);
        /// Mark an invoice as paid.
        action mark_invoice_successful("/sites/{site_id}/invoices/{invoice_id}/mark_successful", invoice_id);
        /// Reopen a closed invoice.
        action reopen_invoice("/sites/{site_id}/invoices/{invoice_id}/reopen", invoice_id);
        /// List an invoice's line items.
        list list_invoice_line_items("/sites/{site_id}/invoices/{invoice_id}/line_items", invoice_id);
        /// List the coupon redemptions applied to an invoice.
        list list_invoice_coupon_redemptions("/sites/{site_id}/invoices/{invoice_id}/coupon_redemptions", invoice_id);
        /// List the credit and charge invoices related to an invoice.
        list list_related_invoices("/sites/{site_id}/invoices/{invoice_id}/related_invoices", invoice_id);
        /// Refund an invoice.
        create refund_invoice("/sites/{site_id}/invoices/{invoice_id}/refund", invoice_id);

        // Line items
        /// List the site's line items.
        list list_line_items("/sites/{site_id}/line_items");
        /// Fetch a line item.
        get get_line_item("/sites/{site_id}/line_items/{line_item_id}", line_item_id);
        /// Remove an uninvoiced line item.
        remove remove_line_item("/sites/{site_id}/line_items/{line_item_id}", line_item_id);

        // Plans and add-ons
        /// List the site's plans.
        list list_plans("/sites/{site_id}/plans");
        /// Create a plan.
        create create_plan("/sites/{site_id}/plans");
        /// Fetch a plan.
        get get_plan("/sites/{site_id}/plans/{plan_id}", plan_id);
        /// Update a plan.
        update update_plan("/sites/{site_id}/plans/{plan_id}", plan_id);
        /// Remove a plan.
        remove remove_plan("/sites/{site_id}/plans/{plan_id}", plan_id);
        /// List a plan's add-ons.
        list list_plan_add_ons("/sites/{site_id}/plans/{plan_id}/add_ons", plan_id);
        /// Create an add-on on a plan.
        create create_plan_add_on("/sites/{site_id}/plans/{plan_id}/add_ons", plan_id);
        /// Fetch a plan's add-on.
        get get_plan_add_on("/sites/{site_id}/plans/{plan_id}/add_ons/{add_on_id}", plan_id, add_on_id);
        /// Update a plan's add-on.
        update update_plan_add_on("/sites/{site_id}/plans/{plan_id}/add_ons/{add_on_id}", plan_id, add_on_id);
        /// Remove a plan's add-on.
        remove remove_plan_add_on("/sites/{site_id}/plans/{plan_id}/add_ons/{add_on_id}", plan_id, add_on_id);
        /// List add-ons across all plans.
        list list_add_ons("/sites/{site_id}/add_ons");
        /// Fetch an add-on.
        get get_add_on("/sites/{site_id}/add_ons/{add_on_id}", add_on_id);

        // Subscriptions
        /// List the site's subscriptions.
        list list_subscriptions("/sites/{site_id}/subscriptions");
        /// Create a subscription.
        create create_subscription("/sites/{site_id}/subscriptions");
        /// Fetch a subscription.
        get get_subscription("/sites/{site_id}/subscriptions/{subscription_id}", subscription_id);
        /// Modify a subscription in place.
        update modify_subscription("/sites/{site_id}/subscriptions/{subscription_id}", subscription_id);
        /// Cancel a subscription at the end of its term.
        action cancel_subscription("/sites/{site_id}/subscriptions/{subscription_id}/cancel", subscription_id);
        /// Reactivate a canceled subscription.
        action reactivate_subscription("/sites/{site_id}/subscriptions/{subscription_id}/reactivate", subscription_id);
        /// Pause a subscription.
        update pause_subscription("/sites/{site_id}/subscriptions/{subscription_id}/pause", subscription_id);
        /// Resume a paused subscription.
        action resume_subscription("/sites/{site_id}/subscriptions/{subscription_id}/resume", subscription_id);
        /// Fetch a subscription's pending change.
        get get_subscription_change("/sites/{site_id}/subscriptions/{subscription_id}/change", subscription_id);
        /// Schedule a change to a subscription.
        create create_subscription_change("/sites/{site_id}/subscriptions/{subscription_id}/change", subscription_id);
        /// Drop a subscription's pending change.
        remove remove_subscription_change("/sites/{site_id}/subscriptions/{subscription_id}/change", subscription_id);
        /// List a subscription's invoices.
        list list_subscription_invoices("/sites/{site_id}/subscriptions/{subscription_id}/invoices", subscription_id);

        // Transactions
        /// List the site's transactions.
        list list_transactions("/sites/{site_id}/transactions");
        /// Fetch a transaction.
        get get_transaction("/sites/{site_id}/transactions/{transaction_id}", transaction_id);
    }
}
