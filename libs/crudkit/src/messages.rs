//! Machine-readable error codes and the human-readable messages the API returns.

pub mod codes {
    pub const INVALID: &str = "INVALID";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    pub const NO_DATA_FOUND: &str = "NO_DATA_FOUND";
    pub const ALREADY_IN_USED: &str = "ALREADY_IN_USED";
    pub const DUPLICATE_ENTRY: &str = "DUPLICATE_ENTRY";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const WRONG_CREDENTIALS: &str = "WRONG_CREDENTIALS";
    pub const SETTING_KEY_NOT_FOUND: &str = "SETTING_KEY_NOT_FOUND";

    // field-level validation
    pub const REQUIRED: &str = "REQUIRED";
    pub const NULL: &str = "NULL";
    pub const BLANK: &str = "BLANK";
    pub const MAX_LENGTH: &str = "MAX_LENGTH";
    pub const MIN_LENGTH: &str = "MIN_LENGTH";
    pub const INVALID_CHOICE: &str = "INVALID_CHOICE";
    pub const MIN_VALUE: &str = "MIN_VALUE";
    pub const MAX_VALUE: &str = "MAX_VALUE";
    pub const MAX_DIGITS: &str = "MAX_DIGITS";
    pub const MAX_DECIMAL_PLACES: &str = "MAX_DECIMAL_PLACES";
    pub const MAX_WHOLE_DIGITS: &str = "MAX_WHOLE_DIGITS";
    pub const NOT_A_LIST: &str = "NOT_A_LIST";
    pub const EMPTY: &str = "EMPTY";
}

pub const BAD_REQUEST: &str = "Invalid data.";
pub const ALREADY_EXIST: &str = "Already Exist.";
pub const NO_DATA_FOUND: &str = "No Data Found.";
pub const WRONG_CREDENTIALS: &str = "Wrong Credentials.";
pub const PERMISSION_DENIED: &str = "Permission Denied.";
pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized Access.";
pub const DATA_NOT_PROVIDED: &str = "Please provide the data.";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error.";
pub const RESOURCE_NOT_FOUND: &str = "The requested resource was not found.";

pub const CREATED: &str = "Created Successfully.";
pub const UPDATED: &str = "Updated Successfully.";
pub const DELETED: &str = "Deleted Successfully.";

pub const REQUIRED: &str = "This field is required.";
pub const NULL: &str = "This field may not be null.";
pub const BLANK: &str = "This field may not be blank.";
pub const EMPTY_LIST: &str = "This list may not be empty.";
