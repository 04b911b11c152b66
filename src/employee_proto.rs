//! Message types for the `employee.EmployeeService` gRPC service.
//!
//! These mirror the service's `.proto` definitions and are encoded with prost.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MonthSalary {
    #[prost(float, tag = "1")]
    pub basic: f32,
    #[prost(float, tag = "2")]
    pub bonus: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EmployeeStatus {
    Normal = 0,
    OnVacation = 1,
    Resigned = 2,
    Retired = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Employee {
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(int32, tag = "2")]
    pub no: i32,
    #[prost(string, tag = "3")]
    pub first_name: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub last_name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "5")]
    pub salary: ::core::option::Option<MonthSalary>,
    #[prost(enumeration = "EmployeeStatus", tag = "6")]
    pub status: i32,
    #[prost(message, optional, tag = "7")]
    pub last_modified: ::core::option::Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetByNoRequest {
    #[prost(int32, tag = "1")]
    pub no: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmployeeResponse {
    #[prost(message, optional, tag = "1")]
    pub employee: ::core::option::Option<Employee>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAllRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddPhotoRequest {
    #[prost(bytes = "bytes", tag = "1")]
    pub data: ::prost::bytes::Bytes,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddPhotoResponse {
    #[prost(bool, tag = "1")]
    pub is_ok: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmployeeRequest {
    #[prost(message, optional, tag = "1")]
    pub employee: ::core::option::Option<Employee>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenRequest {
    #[prost(string, tag = "1")]
    pub username: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub password: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TokenResponse {
    #[prost(string, tag = "1")]
    pub token: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub expiration: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(bool, tag = "3")]
    pub success: bool,
}
