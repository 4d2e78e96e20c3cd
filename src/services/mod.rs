pub mod expense;

pub use expense::{
    CreateExpenseRequest, ErrorKind, ExpenseService, ServiceError, UpdateExpenseRequest,
};
