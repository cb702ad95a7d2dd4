//! # Checkout wizard
//!
//! Six steps in strict linear order. Every non-terminal step commits exactly
//! one field to the remote session; the wizard only records a value after
//! the routes report that the remote call succeeded, so a failed submission
//! leaves both the step and the data untouched. Going back never undoes a
//! committed remote value — resubmitting a step simply overwrites it.

use serde::Serialize;

use crate::models::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    PaymentMethod,
    ShippingAddress,
    PaymentAddress,
    ShippingMethod,
    Review,
    Confirmation,
}

impl CheckoutStep {
    pub fn index(self) -> usize {
        match self {
            CheckoutStep::PaymentMethod => 0,
            CheckoutStep::ShippingAddress => 1,
            CheckoutStep::PaymentAddress => 2,
            CheckoutStep::ShippingMethod => 3,
            CheckoutStep::Review => 4,
            CheckoutStep::Confirmation => 5,
        }
    }

    fn previous(self) -> CheckoutStep {
        match self {
            CheckoutStep::PaymentMethod | CheckoutStep::ShippingAddress => {
                CheckoutStep::PaymentMethod
            }
            CheckoutStep::PaymentAddress => CheckoutStep::ShippingAddress,
            CheckoutStep::ShippingMethod => CheckoutStep::PaymentAddress,
            CheckoutStep::Review => CheckoutStep::ShippingMethod,
            // The order is placed; there is no way back out of confirmation.
            CheckoutStep::Confirmation => CheckoutStep::Confirmation,
        }
    }
}

/// Values committed so far, in the order the wizard collects them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutData {
    pub payment_method: Option<String>,
    pub shipping_address: Option<Address>,
    pub payment_address: Option<Address>,
    pub shipping_method: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    pub data: CheckoutData,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    pub fn new() -> Self {
        Self {
            step: CheckoutStep::PaymentMethod,
            data: CheckoutData::default(),
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    // Each commit stores the value verbatim and lands on the fixed successor
    // step, so resubmitting a revisited step overwrites and moves forward
    // again.

    pub fn commit_payment_method(&mut self, method: String) {
        self.data.payment_method = Some(method);
        self.step = CheckoutStep::ShippingAddress;
    }

    pub fn commit_shipping_address(&mut self, address: Address) {
        self.data.shipping_address = Some(address);
        self.step = CheckoutStep::PaymentAddress;
    }

    pub fn commit_payment_address(&mut self, address: Address) {
        self.data.payment_address = Some(address);
        self.step = CheckoutStep::ShippingMethod;
    }

    pub fn commit_shipping_method(&mut self, method: String) {
        self.data.shipping_method = Some(method);
        self.step = CheckoutStep::Review;
    }

    /// Review accepted; the order is being submitted.
    pub fn confirm(&mut self) {
        if self.step == CheckoutStep::Review {
            self.step = CheckoutStep::Confirmation;
        }
    }

    /// Step back without undoing any committed remote value.
    pub fn back(&mut self) {
        self.step = self.step.previous();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(first: &str) -> Address {
        Address {
            firstname: first.to_string(),
            lastname: "Yilmaz".to_string(),
            address_1: "Möllner Landstraße 3".to_string(),
            city: "Hamburg".to_string(),
            country_id: "81".to_string(),
            zone_id: "1216".to_string(),
            shipping_address_id: Some("4".to_string()),
            payment_address_id: None,
        }
    }

    #[test]
    fn happy_path_walks_all_six_steps() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(wizard.step(), CheckoutStep::PaymentMethod);

        wizard.commit_payment_method("cod".to_string());
        assert_eq!(wizard.step(), CheckoutStep::ShippingAddress);

        wizard.commit_shipping_address(address("Ayse"));
        assert_eq!(wizard.step(), CheckoutStep::PaymentAddress);

        wizard.commit_payment_address(address("Ayse"));
        assert_eq!(wizard.step(), CheckoutStep::ShippingMethod);

        wizard.commit_shipping_method("flat.flat".to_string());
        assert_eq!(wizard.step(), CheckoutStep::Review);

        wizard.confirm();
        assert_eq!(wizard.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn successful_shipping_address_stores_the_value_verbatim() {
        let mut wizard = CheckoutWizard::new();
        wizard.commit_payment_method("cod".to_string());

        let submitted = address("Ayse");
        wizard.commit_shipping_address(submitted.clone());

        assert_eq!(wizard.step(), CheckoutStep::PaymentAddress);
        assert_eq!(wizard.data.shipping_address, Some(submitted));
    }

    #[test]
    fn failed_submission_means_no_commit_at_all() {
        // The routes only call commit_* after the remote call succeeded, so
        // a failure is simply the absence of a transition.
        let mut wizard = CheckoutWizard::new();
        wizard.commit_payment_method("cod".to_string());

        assert_eq!(wizard.step(), CheckoutStep::ShippingAddress);
        assert_eq!(wizard.data.shipping_address, None);
    }

    #[test]
    fn back_keeps_committed_data_and_resubmission_overwrites() {
        let mut wizard = CheckoutWizard::new();
        wizard.commit_payment_method("cod".to_string());
        wizard.commit_shipping_address(address("Ayse"));

        wizard.back();
        assert_eq!(wizard.step(), CheckoutStep::ShippingAddress);
        // The previously committed value survives the back navigation.
        assert!(wizard.data.shipping_address.is_some());

        wizard.commit_shipping_address(address("Fatma"));
        assert_eq!(wizard.step(), CheckoutStep::PaymentAddress);
        assert_eq!(
            wizard.data.shipping_address.as_ref().unwrap().firstname,
            "Fatma"
        );
    }

    #[test]
    fn back_saturates_at_the_first_step_and_never_leaves_confirmation() {
        let mut wizard = CheckoutWizard::new();
        wizard.back();
        assert_eq!(wizard.step(), CheckoutStep::PaymentMethod);

        wizard.commit_payment_method("cod".to_string());
        wizard.commit_shipping_address(address("Ayse"));
        wizard.commit_payment_address(address("Ayse"));
        wizard.commit_shipping_method("flat.flat".to_string());
        wizard.confirm();

        wizard.back();
        assert_eq!(wizard.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn confirm_is_only_reachable_from_review() {
        let mut wizard = CheckoutWizard::new();
        wizard.confirm();
        assert_eq!(wizard.step(), CheckoutStep::PaymentMethod);
    }
}
