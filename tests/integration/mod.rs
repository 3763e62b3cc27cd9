// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;
pub mod pipeline_test;
pub mod product_repository_test;
pub mod queue_repository_test;
pub mod scheduler_test;
pub mod supervisor_test;
