//! Vending machine transaction engine.
//!
//! The machine walks through `select_product -> receive_money -> give_product`
//! for one purchase at a time. A cancel brings it back to product selection
//! from any state. Credit left after a purchase or a cancel is kept for the
//! next purchase.
//! Also supports async stream of commands.

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::change;
use crate::inventory::Inventory;
use crate::model::{Command, ProductId};

mod state;
pub use state::{State, Transaction};

mod event;
pub use event::Event;

mod error;
pub use error::EngineError;

/// The vending machine.
///
/// Owns the inventory and the transaction in progress.
pub struct Machine {
    inventory: Inventory,
    transaction: Transaction,
}

/// Public API
impl Machine {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            transaction: Transaction::default(),
        }
    }

    /// Run the machine with the given command stream, passing every event to `on_event`
    pub async fn run(
        &mut self,
        mut stream: impl Stream<Item = Command> + Unpin,
        mut on_event: impl FnMut(Event),
    ) {
        self.start().into_iter().for_each(&mut on_event);
        while let Some(command) = stream.next().await {
            // a rejected command never stops the machine
            self.handle(command).into_iter().for_each(&mut on_event);
        }
    }

    pub fn state(&self) -> State {
        self.transaction.state
    }

    pub fn credit(&self) -> Amount {
        self.transaction.credit
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn selected_product(&self) -> Option<ProductId> {
        self.transaction.selected_product()
    }

    /// Events shown before the first input
    pub fn start(&self) -> Vec<Event> {
        self.prompt()
    }

    /// Apply a command, reporting a rejection as an [`Event::Error`] followed
    /// by the prompt for the unchanged state
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        self.apply(command).unwrap_or_else(|e| self.reject(e))
    }

    /// Events for an input rejected before or by the machine: the error, then
    /// the prompt for the current state
    pub fn reject(&self, error: EngineError) -> Vec<Event> {
        let mut events = vec![Event::Error(error)];
        events.extend(self.prompt());
        events
    }

    /// Apply a single command on top of the current machine state.
    ///
    /// After the input transition, the transitions that need no input (paying
    /// with existing credit, dispensing) run until the machine waits for
    /// input again. The returned events end with the next prompt.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Event>, EngineError> {
        let before = self.transaction;
        let result = self.apply_command(command);
        if result.is_err() {
            // inventory is never changed by a failed transition
            self.transaction = before;
        }
        self.log_result(command, before.state, &result);
        result
    }

    /// Select the product to buy. Only valid in [`State::SelectProduct`].
    pub fn select_product(&mut self, id: ProductId) -> Result<Vec<Event>, EngineError> {
        if self.transaction.state != State::SelectProduct {
            return Err(self.wrong_state("select a product"));
        }

        let product = self.inventory.product(id).ok_or(EngineError::OutOfRange)?;
        if !product.in_stock() {
            return Err(EngineError::OutOfStock(id));
        }

        self.transaction.state = State::ReceiveMoney { product: id };
        Ok(Vec::new())
    }

    /// Pay toward the selected product. Only valid in [`State::ReceiveMoney`].
    ///
    /// When the credit already covers the price, moves on to
    /// [`State::GiveProduct`] and `amount` is not taken. Otherwise `amount`
    /// must be positive; without one the state is left as is.
    pub fn receive_money(&mut self, amount: Option<Amount>) -> Result<Vec<Event>, EngineError> {
        let State::ReceiveMoney { product } = self.transaction.state else {
            return Err(self.wrong_state("receive money"));
        };
        let price = self.price(product)?;

        if self.transaction.credit >= price {
            self.transaction.state = State::GiveProduct { product };
            return Ok(Vec::new());
        }

        let Some(amount) = amount else {
            return Ok(Vec::new());
        };
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount);
        }

        self.transaction.credit = self
            .transaction
            .credit
            .checked_add(amount)
            .ok_or(EngineError::InvalidAmount)?;
        if self.transaction.credit >= price {
            self.transaction.state = State::GiveProduct { product };
        }
        Ok(Vec::new())
    }

    /// Hand out the product and change. Only valid in [`State::GiveProduct`].
    ///
    /// Change that cannot be paid out with the coins in stock stays as credit.
    pub fn give_product(&mut self) -> Result<Vec<Event>, EngineError> {
        let State::GiveProduct { product: id } = self.transaction.state else {
            return Err(self.wrong_state("give a product"));
        };

        let product = self.inventory.product(id).ok_or(EngineError::OutOfRange)?;
        if !product.in_stock() {
            return Err(EngineError::OutOfStock(id));
        }
        let name = product.name.clone();
        let owed = self.transaction.credit - product.price;

        let change = change::calculate(owed, self.inventory.coins());
        // coins first: it is the only step that can still fail
        self.inventory.take_coins(&change)?;
        self.inventory.take_product(id)?;

        self.transaction.credit = change.remainder;
        self.transaction.state = State::SelectProduct;

        let mut events = vec![
            Event::ProductDispensed { product: id, name },
            Event::ChangeDispensed(change.clone()),
        ];
        if !change.is_exact() {
            warn!(
                owed = %owed,
                remainder = %change.remainder,
                "not enough coins to give full change, remainder kept as credit"
            );
            events.push(Event::UndispensableRemainder(change.remainder));
        }
        Ok(events)
    }

    /// Abandon the purchase in progress. Valid in every state; credit is kept.
    pub fn cancel(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.transaction.credit.is_positive() {
            events.push(Event::RetainedOnCancel(self.transaction.credit));
        }
        self.transaction.state = State::SelectProduct;
        events
    }
}

/// Private API
impl Machine {
    fn apply_command(&mut self, command: Command) -> Result<Vec<Event>, EngineError> {
        let mut events = match command {
            Command::Cancel => self.cancel(),
            Command::Select(id) => self.select_product(id)?,
            Command::Insert(amount) => self.receive_money(Some(amount))?,
        };
        self.settle(&mut events)?;
        events.extend(self.prompt());
        Ok(events)
    }

    /// Run the transitions that need no input
    fn settle(&mut self, events: &mut Vec<Event>) -> Result<(), EngineError> {
        loop {
            match self.transaction.state {
                State::ReceiveMoney { product } => {
                    if self.transaction.credit < self.price(product)? {
                        return Ok(());
                    }
                    events.extend(self.receive_money(None)?);
                }
                State::GiveProduct { .. } => events.extend(self.give_product()?),
                State::SelectProduct => return Ok(()),
            }
        }
    }

    /// The events asking for the input the current state waits for
    fn prompt(&self) -> Vec<Event> {
        match self.transaction.state {
            State::SelectProduct => vec![
                Event::ProductList(self.inventory.listing()),
                Event::PromptForIdentifier,
            ],
            State::ReceiveMoney { product } => match self.price(product) {
                Ok(price) => vec![Event::PromptForAmount(price - self.transaction.credit)],
                Err(_) => Vec::new(),
            },
            State::GiveProduct { .. } => Vec::new(),
        }
    }

    fn price(&self, id: ProductId) -> Result<Amount, EngineError> {
        self.inventory
            .product(id)
            .map(|p| p.price)
            .ok_or(EngineError::OutOfRange)
    }

    fn wrong_state(&self, operation: &'static str) -> EngineError {
        EngineError::WrongState {
            operation,
            state: self.transaction.state,
        }
    }

    /// Small helper to log `apply` results
    fn log_result<T>(&self, command: Command, from: State, result: &Result<T, EngineError>) {
        let to = self.transaction.state;
        let credit = self.transaction.credit;
        match result {
            Ok(_) => {
                info!(
                    command = ?command,
                    from = %from,
                    to = %to,
                    credit = %credit,
                    "command applied"
                );
            }
            Err(e) => {
                info!(
                    command = ?command,
                    state = %to,
                    credit = %credit,
                    reason = %e,
                    "command rejected"
                );
            }
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(Inventory::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use crate::model::{Coin, Product};

    // test utils

    fn cents(value: i64) -> Amount {
        Amount::from_cents(value)
    }

    fn insert(value: i64) -> Command {
        Command::Insert(cents(value))
    }

    fn coin_stocks(machine: &Machine) -> Vec<u32> {
        machine.inventory().coins().iter().map(|c| c.stock).collect()
    }

    #[test]
    fn new_machine() {
        let machine = Machine::default();
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), Amount::ZERO);
        assert_eq!(machine.selected_product(), None);
    }

    #[test]
    fn start_lists_products_and_asks_for_id() {
        let machine = Machine::default();
        let events = machine.start();
        assert!(matches!(&events[0], Event::ProductList(rows) if rows.len() == 3));
        assert_eq!(events[1], Event::PromptForIdentifier);
    }

    // Select product

    #[test]
    fn select_product_moves_to_receive_money() {
        let mut machine = Machine::default();
        let events = machine.apply(Command::Select(0)).unwrap();

        assert_eq!(machine.state(), State::ReceiveMoney { product: 0 });
        assert_eq!(machine.selected_product(), Some(0));
        assert_eq!(events, vec![Event::PromptForAmount(cents(250))]);
    }

    #[test]
    fn select_out_of_range_stays_in_select_product() {
        let mut machine = Machine::default();
        let result = machine.apply(Command::Select(10));

        assert_eq!(result, Err(EngineError::OutOfRange));
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.selected_product(), None);
    }

    #[test]
    fn select_out_of_stock_stays_in_select_product() {
        let products = vec![Product::new("empty", 0, cents(100))];
        let inventory = Inventory::new(Inventory::default().coins().to_vec(), products).unwrap();
        let mut machine = Machine::new(inventory);

        let result = machine.apply(Command::Select(0));
        assert_eq!(result, Err(EngineError::OutOfStock(0)));
        assert_eq!(machine.state(), State::SelectProduct);
    }

    #[test]
    fn handle_reports_error_then_prompts_again() {
        let mut machine = Machine::default();
        let events = machine.handle(Command::Select(10));

        assert_eq!(events[0], Event::Error(EngineError::OutOfRange));
        assert!(matches!(events[1], Event::ProductList(_)));
        assert_eq!(events[2], Event::PromptForIdentifier);
    }

    #[test]
    fn insert_while_selecting_is_rejected() {
        let mut machine = Machine::default();
        let result = machine.apply(insert(100));

        assert!(matches!(result, Err(EngineError::WrongState { .. })));
        assert_eq!(machine.credit(), Amount::ZERO);
    }

    // Receive money

    #[test]
    fn enough_money_gives_product_and_change() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        let events = machine.apply(insert(1000)).unwrap();

        assert_eq!(
            events[0],
            Event::ProductDispensed {
                product: 0,
                name: "good 1".to_string()
            }
        );
        let expected: Change = Change {
            breakdown: [(cents(500), 1), (cents(200), 1), (cents(50), 1)]
                .into_iter()
                .collect(),
            remainder: Amount::ZERO,
        };
        assert_eq!(events[1], Event::ChangeDispensed(expected));
        assert!(matches!(events[2], Event::ProductList(_)));
        assert_eq!(events[3], Event::PromptForIdentifier);

        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), Amount::ZERO);
        assert_eq!(machine.inventory().product(0).unwrap().stock, 0);
    }

    #[test]
    fn not_enough_money_keeps_waiting() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        let events = machine.apply(insert(100)).unwrap();

        assert_eq!(events, vec![Event::PromptForAmount(cents(150))]);
        assert_eq!(machine.state(), State::ReceiveMoney { product: 0 });
        assert_eq!(machine.credit(), cents(100));
    }

    #[test]
    fn non_positive_amount_is_discarded() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        machine.apply(insert(100)).unwrap();

        assert_eq!(machine.apply(insert(0)), Err(EngineError::InvalidAmount));
        assert_eq!(machine.apply(insert(-500)), Err(EngineError::InvalidAmount));
        assert_eq!(machine.credit(), cents(100));
        assert_eq!(machine.state(), State::ReceiveMoney { product: 0 });
    }

    #[test]
    fn amount_overflowing_credit_is_discarded() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        machine.apply(insert(100)).unwrap();

        let result = machine.apply(Command::Insert(Amount::from_cents(i64::MAX)));
        assert_eq!(result, Err(EngineError::InvalidAmount));
        assert_eq!(machine.credit(), cents(100));
        assert_eq!(machine.state(), State::ReceiveMoney { product: 0 });
        assert_eq!(machine.inventory().product(0).unwrap().stock, 1);
    }

    #[test]
    fn receive_money_without_amount_waits() {
        let mut machine = Machine::default();
        machine.select_product(0).unwrap();

        assert_eq!(machine.receive_money(None), Ok(Vec::new()));
        assert_eq!(machine.state(), State::ReceiveMoney { product: 0 });
    }

    #[test]
    fn receive_money_with_enough_credit_does_not_take_new_input() {
        let mut machine = Machine::default();
        machine.transaction.credit = cents(300);
        machine.select_product(0).unwrap();

        machine.receive_money(Some(cents(500))).unwrap();
        assert_eq!(machine.state(), State::GiveProduct { product: 0 });
        assert_eq!(machine.credit(), cents(300));
    }

    #[test]
    fn leftover_credit_pays_for_next_product_without_input() {
        let mut machine = Machine::default();
        machine.transaction.credit = cents(300);

        let events = machine.apply(Command::Select(1)).unwrap();
        assert!(events.contains(&Event::ProductDispensed {
            product: 1,
            name: "good 2".to_string()
        }));
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), Amount::ZERO);
        assert_eq!(machine.inventory().coin(cents(200)).unwrap().stock, 9);
    }

    // Give product

    #[test]
    fn give_product_decrements_stocks_and_keeps_remainder() {
        let mut machine = Machine::default();
        machine.transaction = Transaction {
            state: State::GiveProduct { product: 0 },
            credit: cents(1126),
        };

        let events = machine.give_product().unwrap();
        assert_eq!(events.last(), Some(&Event::UndispensableRemainder(cents(1))));
        assert_eq!(machine.inventory().product(0).unwrap().stock, 0);
        assert!(coin_stocks(&machine).iter().all(|&stock| stock == 9));
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), cents(1));
    }

    #[test]
    fn give_product_outside_give_state_fails() {
        let mut machine = Machine::default();
        let result = machine.give_product();
        assert_eq!(
            result,
            Err(EngineError::WrongState {
                operation: "give a product",
                state: State::SelectProduct,
            })
        );
    }

    #[test]
    fn change_falls_back_when_coins_run_out() {
        let coins = vec![Coin::new(cents(25), 10), Coin::new(cents(100), 0)];
        let products = vec![Product::new("gum", 5, cents(50))];
        let mut machine = Machine::new(Inventory::new(coins, products).unwrap());

        machine.apply(Command::Select(0)).unwrap();
        let events = machine.apply(insert(150)).unwrap();

        let expected = Change {
            breakdown: [(cents(25), 4)].into_iter().collect(),
            remainder: Amount::ZERO,
        };
        assert_eq!(events[1], Event::ChangeDispensed(expected));
        assert_eq!(machine.inventory().coin(cents(25)).unwrap().stock, 6);
    }

    // Cancel

    #[test]
    fn cancel_after_select_returns_to_select_product() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        let events = machine.apply(Command::Cancel).unwrap();

        assert!(matches!(events[0], Event::ProductList(_)));
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.selected_product(), None);
        assert_eq!(machine.credit(), Amount::ZERO);
    }

    #[test]
    fn cancel_after_payment_retains_money() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        machine.apply(insert(100)).unwrap();
        let events = machine.apply(Command::Cancel).unwrap();

        assert_eq!(events[0], Event::RetainedOnCancel(cents(100)));
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), cents(100));
        assert_eq!(machine.inventory().product(0).unwrap().stock, 1);
    }

    #[test]
    fn cancel_while_giving_product_keeps_credit() {
        let mut machine = Machine::default();
        machine.transaction = Transaction {
            state: State::GiveProduct { product: 0 },
            credit: cents(300),
        };

        let events = machine.cancel();
        assert_eq!(events, vec![Event::RetainedOnCancel(cents(300))]);
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.selected_product(), None);
        assert_eq!(machine.credit(), cents(300));
        assert_eq!(machine.inventory().product(0).unwrap().stock, 1);
        assert!(coin_stocks(&machine).iter().all(|&stock| stock == 10));
    }

    #[test]
    fn cancel_while_selecting_is_harmless() {
        let mut machine = Machine::default();
        let events = machine.apply(Command::Cancel).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(machine.state(), State::SelectProduct);
    }

    // Full flow

    #[test]
    fn pay_in_two_steps_leaves_one_cent() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(0)).unwrap();
        machine.apply(insert(100)).unwrap();
        let events = machine.apply(insert(1026)).unwrap();

        assert!(events.contains(&Event::UndispensableRemainder(cents(1))));
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), cents(1));
        assert_eq!(machine.inventory().product(0).unwrap().stock, 0);
    }

    #[test]
    fn sold_out_product_cannot_be_bought_again() {
        let mut machine = Machine::default();
        machine.apply(Command::Select(1)).unwrap();
        machine.apply(insert(100)).unwrap();

        assert_eq!(machine.apply(Command::Select(1)), Err(EngineError::OutOfStock(1)));
    }

    //  Async run()

    #[tokio::test]
    async fn run_processes_all_commands() {
        let mut machine = Machine::default();
        let commands = vec![Command::Select(0), insert(100), insert(1026)];
        let mut events = Vec::new();

        machine
            .run(tokio_stream::iter(commands), |e| events.push(e))
            .await;

        assert_eq!(machine.credit(), cents(1));
        assert!(events.contains(&Event::UndispensableRemainder(cents(1))));
    }

    #[tokio::test]
    async fn run_skips_rejected_commands_and_continues() {
        let mut machine = Machine::default();
        let commands = vec![
            Command::Select(10), // out of range
            Command::Select(0),
            insert(0), // invalid amount
            insert(100),
            Command::Cancel,
        ];
        let mut errors = Vec::new();

        machine
            .run(tokio_stream::iter(commands), |e| {
                if let Event::Error(err) = e {
                    errors.push(err);
                }
            })
            .await;

        assert_eq!(errors, vec![EngineError::OutOfRange, EngineError::InvalidAmount]);
        assert_eq!(machine.state(), State::SelectProduct);
        assert_eq!(machine.credit(), cents(100));
    }
}
